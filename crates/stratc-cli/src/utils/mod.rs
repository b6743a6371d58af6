//! Utility modules for the stratc CLI

pub mod file_utils;
