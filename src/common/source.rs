use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

/// `Source` represents some literal source text.
/// Either a template handed to the parser, or the script
/// the compiler generates from a template. It's essentially
/// a string with a path, the path serving as the source's
/// name. Templates without a name point to `./template`.
#[derive(Debug, PartialEq, Eq)]
pub struct Source {
    pub contents: String,
    pub path: PathBuf,
}

impl Source {
    /// Creates a new `Source` given both an `&str` and a
    /// `Path` used as its name.
    pub fn new(source: &str, path: &Path) -> Rc<Source> {
        Rc::new(Source {
            contents: source.to_string(),
            path: path.to_owned(),
        })
    }

    /// Build a `Source` containing just a template string.
    /// Note that this source will point towards `./template`.
    pub fn source(source: &str) -> Rc<Source> {
        Source::new(source, &PathBuf::from("./template"))
    }

    /// Build the `Source` of a script generated by the compiler.
    pub fn generated(source: &str) -> Rc<Source> {
        Source::new(source, &PathBuf::from("./generated"))
    }

    pub fn len(&self) -> usize { self.contents.len() }

    pub fn is_empty(&self) -> bool { self.contents.is_empty() }
}
