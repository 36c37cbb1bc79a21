//! # CTPA标注查看器
//!
//! 把分析结果渲染为Graphviz图和着色HTML，并通过Web页面上的滑块逐份浏览。

pub mod handlers;
pub mod server;
pub mod viewer;

pub use server::WebServer;
pub use viewer::{markup_to_dot, markup_to_html, MarkupViewer, RenderedMarkup};
