//! Shared test harness modules for the groomer CLI.

use super::*;

mod helpers;
