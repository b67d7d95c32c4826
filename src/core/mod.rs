//! Core Module
//!
//! Infraestrutura central compartilhada pelos drivers: logging e
//! configuração de boot.

pub mod boot;
pub mod logging;
