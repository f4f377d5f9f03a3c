//! Flutter bridge for the daily reflection core.

pub mod api;
