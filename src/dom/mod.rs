//! Arena DOM for HTML fragments.
//!
//! html5ever builds the tree through [`DocumentSink`], the `selectors` crate
//! matches against it through [`ElementRef`], and [`serialize`] writes
//! subtrees back out.

mod document;
mod element_ref;
pub mod serialize;
mod tree_sink;

pub use document::{Attribute, Children, Document, Node, NodeData, NodeId};
pub use element_ref::{ElementRef, InkSelectors};
pub use serialize::{inner_html, outer_html};
pub use tree_sink::{DocumentSink, Handle, parse_html};
