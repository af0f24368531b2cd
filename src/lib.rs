//! Client for the TechEndeavor blog: session handling, paged feed, article
//! pages and publishing, on top of the blog's HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod model;
pub mod pages;
pub mod render;
pub mod session;
pub mod shell;
