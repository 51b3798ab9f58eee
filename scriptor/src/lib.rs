//! scriptor - sectioned manuscript editing and export
//!
//! A book is an ordered list of named sections holding rich HTML. This
//! library normalizes that HTML, renders the whole book as one paginated
//! HTML document, resolves page geometry, and hands the result to remote
//! PDF/DOCX export services or to local HTML/Markdown/text exporters.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod document_model;
pub mod find_replace;
pub mod geometry;
pub mod html_tree;
pub mod normalizer;
pub mod project_store;
pub mod prompts;
pub mod renderer;
pub mod session;

// Remote export: request/response contract and client
pub mod gateway;
pub mod service;

// Imports and local exporters
pub mod html_exporter;
pub mod manuscript;
pub mod markdown_exporter;
pub mod text_exporter;
