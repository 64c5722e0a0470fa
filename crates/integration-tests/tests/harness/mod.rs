#![allow(dead_code)]

pub mod accounts;
pub mod config;
pub mod server;
