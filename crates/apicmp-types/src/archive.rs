//! Archives and the APIs grouping them.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use bytes::Bytes;

use crate::error::TypeError;

/// An opaque, named, byte-streamable artifact.
///
/// Archives are owned by the caller. Analysis only reads them, and only
/// through [`with_stream`](trait.Archive.html#method.with_stream), which
/// drops the stream on every exit path.
pub trait Archive: fmt::Debug + Send + Sync {
    /// The archive's name, used in reports and error messages.
    fn name(&self) -> &str;

    /// Open a fresh stream over the archive's bytes.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;
}

impl dyn Archive + '_ {
    /// Run `f` with a stream over the archive's bytes.
    ///
    /// I/O errors from opening or reading are reported as
    /// [`TypeError::ArchiveRead`] naming this archive.
    pub fn with_stream<T>(
        &self,
        f: impl FnOnce(&mut dyn Read) -> io::Result<T>,
    ) -> Result<T, TypeError> {
        let read_error = |e: io::Error| TypeError::ArchiveRead {
            archive: self.name().to_string(),
            message: e.to_string(),
        };
        let mut stream = self.open().map_err(read_error)?;
        f(stream.as_mut()).map_err(read_error)
    }

    /// Read the whole archive into memory.
    pub fn read_all(&self) -> Result<Bytes, TypeError> {
        self.with_stream(|stream| {
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf)?;
            Ok(Bytes::from(buf))
        })
    }
}

/// An archive held entirely in memory.
#[derive(Clone, Debug)]
pub struct InMemoryArchive {
    name: String,
    data: Bytes,
}

impl InMemoryArchive {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Archive for InMemoryArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.data.as_ref()))
    }
}

/// One side of a comparison: primary archives whose elements form the
/// observable surface, plus supplementary archives that only contribute
/// elements reachable from it.
#[derive(Clone, Debug, Default)]
pub struct Api {
    archives: Vec<Arc<dyn Archive>>,
    supplementary: Vec<Arc<dyn Archive>>,
}

impl Api {
    pub fn builder() -> ApiBuilder {
        ApiBuilder::default()
    }

    /// Primary archives in the order they were added.
    pub fn archives(&self) -> &[Arc<dyn Archive>] {
        &self.archives
    }

    pub fn supplementary_archives(&self) -> &[Arc<dyn Archive>] {
        &self.supplementary
    }

    /// Whether the named archive is supplementary in this API.
    pub fn is_supplementary(&self, archive: &str) -> bool {
        self.supplementary.iter().any(|a| a.name() == archive)
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.archives.iter().map(|a| a.name()).collect();
        write!(f, "[{}]", names.join(", "))?;
        if !self.supplementary.is_empty() {
            let names: Vec<&str> = self.supplementary.iter().map(|a| a.name()).collect();
            write!(f, " + supplementary [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

/// Builder for [`Api`].
#[derive(Debug, Default)]
pub struct ApiBuilder {
    archives: Vec<Arc<dyn Archive>>,
    supplementary: Vec<Arc<dyn Archive>>,
}

impl ApiBuilder {
    pub fn archive(mut self, archive: impl Archive + 'static) -> Self {
        self.archives.push(Arc::new(archive));
        self
    }

    pub fn shared_archive(mut self, archive: Arc<dyn Archive>) -> Self {
        self.archives.push(archive);
        self
    }

    pub fn supplementary(mut self, archive: impl Archive + 'static) -> Self {
        self.supplementary.push(Arc::new(archive));
        self
    }

    pub fn build(self) -> Arc<Api> {
        Arc::new(Api {
            archives: self.archives,
            supplementary: self.supplementary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Unreadable;

    impl Archive for Unreadable {
        fn name(&self) -> &str {
            "broken.jar"
        }

        fn open(&self) -> io::Result<Box<dyn Read + '_>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        }
    }

    #[test]
    fn in_memory_archive_streams_its_bytes() {
        let archive: &dyn Archive = &InMemoryArchive::new("v1.json", &b"{\"a\":1}"[..]);
        let bytes = archive.read_all().unwrap();
        assert_eq!(&bytes[..], b"{\"a\":1}");
    }

    #[test]
    fn stream_is_fresh_on_every_read() {
        let archive: &dyn Archive = &InMemoryArchive::new("x", &b"abc"[..]);
        let first = archive
            .with_stream(|s| {
                let mut one = [0u8; 1];
                s.read_exact(&mut one)?;
                Ok(one[0])
            })
            .unwrap();
        assert_eq!(first, b'a');
        assert_eq!(&archive.read_all().unwrap()[..], b"abc");
    }

    #[test]
    fn read_failures_name_the_archive() {
        let archive: &dyn Archive = &Unreadable;
        let err = archive.read_all().unwrap_err();
        assert!(matches!(err, TypeError::ArchiveRead { ref archive, .. } if archive == "broken.jar"));
    }

    #[test]
    fn api_keeps_archive_order_and_supplementary_set() {
        let api = Api::builder()
            .archive(InMemoryArchive::new("b", Bytes::new()))
            .archive(InMemoryArchive::new("a", Bytes::new()))
            .supplementary(InMemoryArchive::new("dep", Bytes::new()))
            .build();
        let names: Vec<&str> = api.archives().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(api.is_supplementary("dep"));
        assert!(!api.is_supplementary("a"));
        assert_eq!(api.to_string(), "[b, a] + supplementary [dep]");
    }
}
