//! General utility traits shared by the readers and the schema inferencer.

use std::{collections::HashSet, ffi::OsStr, hash::Hash, path::Path};

/// Lowercase file extension of a path, used to recognize uploads.
pub trait PathExtension {
    /// `None` when the path has no extension or it is not valid UTF-8.
    fn extension_as_lowercase(&self) -> Option<String>;
}

impl PathExtension for Path {
    fn extension_as_lowercase(&self) -> Option<String> {
        self.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
    }
}

/// Order-preserving deduplication for vectors.
/// Used for the delimiter candidates and for repeated header names.
pub trait UniqueElements<T> {
    /// Removes duplicate elements in place, keeping the first occurrence.
    fn unique(&mut self)
    where
        T: Eq + Hash + Clone;
}

impl<T> UniqueElements<T> for Vec<T> {
    fn unique(&mut self)
    where
        T: Eq + Hash + Clone,
    {
        let mut seen = HashSet::with_capacity(self.len());
        self.retain(|x| seen.insert(x.clone()));
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

#[cfg(test)]
mod tests_traits {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_upload_extensions() {
        assert_eq!(
            PathBuf::from("Sales Q1.XLSX").extension_as_lowercase(),
            Some("xlsx".to_string())
        );
        assert_eq!(
            PathBuf::from("exports/people.v2.csv").extension_as_lowercase(),
            Some("csv".to_string())
        );
        assert_eq!(PathBuf::from("exports/people").extension_as_lowercase(), None);
        assert_eq!(PathBuf::from("exports/.").extension_as_lowercase(), None);
    }

    #[test]
    fn test_unique_delimiters_keep_configured_first() {
        let mut delimiters = vec![b';', b',', b';', b'|', b'\t'];
        delimiters.unique();
        assert_eq!(delimiters, vec![b';', b',', b'|', b'\t']);
    }

    #[test]
    fn test_unique_headers() {
        let mut headers = vec!["name", "age", "name", "city", "age"];
        headers.unique();
        assert_eq!(headers, vec!["name", "age", "city"]);

        let mut empty: Vec<&str> = Vec::new();
        empty.unique();
        assert!(empty.is_empty());
    }
}
