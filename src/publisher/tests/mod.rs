//! Integration-style tests driving the full publisher with scripted strategies.


pub(crate) use super::test_helpers::*;
pub(crate) use crate::config::Config;
pub(crate) use crate::error::Error;
pub(crate) use crate::types::{Event, TargetStatus, Verdict};
pub(crate) use std::time::Duration;
