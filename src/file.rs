//! Path-based reading and writing.
//!
//! A path of `"stdin"` or `"stdout"` means the standard stream. When a path
//! cannot be opened and does not already end in `.gz`, `<path>.gz` is tried
//! and read through gzip. The gzip-aware path reads plain files transparently;
//! the raw path rejects gzip data with [`PicError::BadMagic`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use enough::{Stop, Unstoppable};

use crate::decode::{self, DecodeOptions, ShortReadPolicy, Stage};
use crate::descriptor::PicDescriptor;
use crate::encode::{EncodeRequest, encode_stream, write_pixels};
use crate::endian::ByteOrder;
use crate::error::PicError;
use crate::format::{GZIP_MAGIC, PicFormat, sniff};
use crate::io::{ByteSink, IoSink, IoSource};
use crate::limits::Limits;

/// Path sentinel for standard input.
pub const STDIN: &str = "stdin";
/// Path sentinel for standard output.
pub const STDOUT: &str = "stdout";

fn open_failed(path: &Path, source: io::Error) -> PicError {
    PicError::OpenFailed {
        path: path.display().to_string(),
        source,
    }
}

fn gz_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

fn has_gz_suffix(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

enum Input {
    Stdin(io::StdinLock<'static>),
    Raw(BufReader<File>),
    #[cfg(feature = "gzip")]
    Gzip(flate2::read::GzDecoder<BufReader<File>>),
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Input::Stdin(r) => r.read(buf),
            Input::Raw(r) => r.read(buf),
            #[cfg(feature = "gzip")]
            Input::Gzip(r) => r.read(buf),
        }
    }
}

/// Wrap `file` for the gzip-aware path: gzip data is inflated, anything else
/// passes through unchanged.
#[cfg(feature = "gzip")]
fn gzip_aware(file: File) -> io::Result<Input> {
    let mut reader = BufReader::new(file);
    if reader.fill_buf()?.starts_with(GZIP_MAGIC) {
        Ok(Input::Gzip(flate2::read::GzDecoder::new(reader)))
    } else {
        Ok(Input::Raw(reader))
    }
}

#[cfg(not(feature = "gzip"))]
fn gzip_aware(file: File) -> io::Result<Input> {
    let mut reader = BufReader::new(file);
    if reader.fill_buf()?.starts_with(GZIP_MAGIC) {
        tracing::error!("gzip support is not compiled in");
    }
    Ok(Input::Raw(reader))
}

fn open_input(path: &Path, force_gzip: bool) -> Result<Input, PicError> {
    if path.as_os_str() == STDIN {
        return Ok(Input::Stdin(io::stdin().lock()));
    }
    match File::open(path) {
        Ok(file) if force_gzip || has_gz_suffix(path) => {
            gzip_aware(file).map_err(|e| open_failed(path, e))
        }
        Ok(file) => Ok(Input::Raw(BufReader::new(file))),
        Err(err) if !has_gz_suffix(path) => {
            let fallback = gz_sibling(path);
            match File::open(&fallback) {
                Ok(file) => {
                    tracing::debug!(path = %fallback.display(), "falling back to gzip sibling");
                    gzip_aware(file).map_err(|e| open_failed(&fallback, e))
                }
                Err(_) => Err(open_failed(path, err)),
            }
        }
        Err(err) => Err(open_failed(path, err)),
    }
}

/// Read a PIC image from a file path.
#[derive(Clone, Debug)]
pub struct ReadRequest<'a> {
    path: &'a Path,
    options: DecodeOptions<'a>,
    gzip: bool,
}

impl<'a> ReadRequest<'a> {
    pub fn new<P: AsRef<Path> + ?Sized>(path: &'a P) -> Self {
        Self {
            path: path.as_ref(),
            options: DecodeOptions::default(),
            gzip: false,
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.options.limits = Some(limits);
        self
    }

    pub fn with_short_read(mut self, policy: ShortReadPolicy) -> Self {
        self.options.short_read = policy;
        self
    }

    pub fn with_memory_order(mut self, order: ByteOrder) -> Self {
        self.options.memory_order = order;
        self
    }

    /// Read through gzip even when the path has no `.gz` suffix.
    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    fn source(&self) -> Result<IoSource<Input>, PicError> {
        Ok(IoSource::new(open_input(self.path, self.gzip)?))
    }

    fn run(&self, pic: &mut PicDescriptor, stage: Stage, stop: &dyn Stop) -> Result<(), PicError> {
        let mut src = self.source()?;
        decode::decode_into(&mut src, pic, stage, &self.options, stop)
    }

    /// Full decode.
    pub fn get(self, stop: impl Stop) -> Result<PicDescriptor, PicError> {
        let mut pic = PicDescriptor::new();
        self.run(&mut pic, Stage::Pixels, &stop)?;
        Ok(pic)
    }

    /// Header only; the result is write protected.
    pub fn get_header(self) -> Result<PicDescriptor, PicError> {
        let mut pic = PicDescriptor::new();
        self.run(&mut pic, Stage::Header, &Unstoppable)?;
        Ok(pic)
    }

    /// Header and tags; the result is write protected.
    pub fn get_tags(self, stop: impl Stop) -> Result<PicDescriptor, PicError> {
        let mut pic = PicDescriptor::new();
        self.run(&mut pic, Stage::Tags, &stop)?;
        Ok(pic)
    }

    /// Full decode into `pic`, reusing its pixel buffer when the size matches.
    pub fn get_into(self, pic: &mut PicDescriptor, stop: impl Stop) -> Result<(), PicError> {
        self.run(pic, Stage::Pixels, &stop)
    }

    /// Replace `pic`'s header and tags. A pixel buffer of the new size is
    /// kept; any other is dropped and `pic` becomes write protected.
    pub fn get_tags_into(self, pic: &mut PicDescriptor, stop: impl Stop) -> Result<(), PicError> {
        self.run(pic, Stage::Tags, &stop)
    }

    /// Full decode into `pic` only if the image has `pic`'s size. On any
    /// error `pic` is untouched.
    pub fn get_into_checked(self, pic: &mut PicDescriptor, stop: impl Stop) -> Result<(), PicError> {
        let mut src = self.source()?;
        decode::decode_into_checked(&mut src, pic, &self.options, &stop)
    }

    /// Header, tags and the 1-based slice `slice` of the last dimension.
    pub fn get_slice(self, slice: u32, stop: impl Stop) -> Result<PicDescriptor, PicError> {
        let mut src = self.source()?;
        decode::decode_slice(&mut src, slice, &self.options, &stop)
    }
}

/// Run `write` against the output for `path`: standard output for the
/// sentinel, otherwise a freshly created file (any old one is removed first).
pub(crate) fn create_output<T>(
    path: &Path,
    write: impl FnOnce(&mut dyn Write) -> Result<T, PicError>,
) -> Result<T, PicError> {
    if path.as_os_str() == STDOUT {
        return write(&mut io::stdout().lock());
    }
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed existing file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(open_failed(path, e)),
    }
    let file = File::create(path).map_err(|e| open_failed(path, e))?;
    write(&mut BufWriter::new(file))
}

/// Write `pic` as slice `slice` (1-based) of the last dimension of the
/// file at `path`.
pub(crate) fn write_slice(
    pic: &PicDescriptor,
    path: &Path,
    slice: u32,
    memory_order: ByteOrder,
    stop: &dyn Stop,
) -> Result<(), PicError> {
    pic.validate_for_write()?;
    if slice == 0 {
        return Err(PicError::SliceOutOfRange { slice, count: 0 });
    }
    let data = pic
        .data()
        .ok_or_else(|| PicError::InvalidDescriptor("no pixel data to write".into()))?;
    let width = pic.element_type.swap_width(pic.bpe);
    let slice_size = pic.size_in_bytes();

    match fs::metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let mut header = pic.copy_header();
            header.tags = pic.tags.clone();
            header.shape = pic.shape.with_appended(slice).ok_or_else(|| {
                PicError::InvalidDescriptor(format!("rank {} slice cannot gain a dimension", pic.rank()))
            })?;
            let file = File::create(path).map_err(|e| open_failed(path, e))?;
            let mut sink = IoSink::new(BufWriter::new(file));
            encode_stream(&header, &mut sink, memory_order, stop)?;
            let zeros = vec![0u8; decode::CHUNK_SIZE];
            let mut pad = u64::from(slice - 1) * slice_size;
            while pad > 0 {
                stop.check()?;
                let n = pad.min(zeros.len() as u64) as usize;
                sink.write_all(&zeros[..n])?;
                pad -= n as u64;
            }
            write_pixels(data, width, &mut sink, memory_order)?;
            sink.into_inner().flush()?;
            Ok(())
        }
        Err(e) => Err(open_failed(path, e)),
        Ok(_) => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|e| open_failed(path, e))?;
            overwrite_slice(&file, pic, data, slice, memory_order, stop)
        }
    }
}

fn overwrite_slice(
    mut file: &File,
    pic: &PicDescriptor,
    data: &[u8],
    slice: u32,
    memory_order: ByteOrder,
    stop: &dyn Stop,
) -> Result<(), PicError> {
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    match sniff(&magic) {
        PicFormat::Modern => {}
        PicFormat::GzipOnRawPath => {
            tracing::error!("cannot write a slice into a compressed file");
            return Err(PicError::BadMagic);
        }
        PicFormat::Legacy => {
            return Err(PicError::InvalidDescriptor(
                "slices can only be written into modern PIC files".into(),
            ));
        }
    }
    file.seek(SeekFrom::Start(0))?;

    let mut existing = PicDescriptor::new();
    let options = DecodeOptions {
        memory_order,
        ..DecodeOptions::default()
    };
    let mut src = IoSource::new(BufReader::new(file));
    decode::decode_into(&mut src, &mut existing, Stage::Tags, &options, stop)?;
    drop(src);

    if existing.element_type != pic.element_type
        || existing.bpe != pic.bpe
        || existing.shape.without_last() != pic.shape
        || existing.rank() != pic.rank() + 1
    {
        return Err(PicError::InvalidDescriptor(format!(
            "slice {} {}-bit {} does not fit file {} {}-bit {}",
            pic.element_type, pic.bpe, pic.shape, existing.element_type, existing.bpe, existing.shape
        )));
    }

    let slice_size = pic.size_in_bytes();
    let count = existing.shape.last().unwrap_or(0);
    if slice > count {
        let extent_offset = 48 + 4 * (existing.rank() as u64 - 1);
        file.seek(SeekFrom::Start(extent_offset))?;
        file.write_all(&slice.to_le_bytes())?;
        tracing::debug!(from = count, to = slice, "growing last dimension");
    }
    let needed = existing.pixel_start_offset + u64::from(slice.max(count)) * slice_size;
    if file.metadata()?.len() < needed {
        file.set_len(needed)?;
    }

    file.seek(SeekFrom::Start(
        existing.pixel_start_offset + u64::from(slice - 1) * slice_size,
    ))?;
    let mut sink = IoSink::new(BufWriter::new(file));
    write_pixels(data, pic.element_type.swap_width(pic.bpe), &mut sink, memory_order)?;
    sink.into_inner().flush()?;
    Ok(())
}

// ── One-call helpers ────────────────────────────────────────────────

/// Decode the image at `path`.
pub fn get(path: impl AsRef<Path>) -> Result<PicDescriptor, PicError> {
    ReadRequest::new(path.as_ref()).get(Unstoppable)
}

/// Header of the image at `path`, without tags or pixels.
pub fn get_header(path: impl AsRef<Path>) -> Result<PicDescriptor, PicError> {
    ReadRequest::new(path.as_ref()).get_header()
}

/// Header and tags of the image at `path`, without pixels.
pub fn get_tags(path: impl AsRef<Path>) -> Result<PicDescriptor, PicError> {
    ReadRequest::new(path.as_ref()).get_tags(Unstoppable)
}

pub fn get_into(path: impl AsRef<Path>, pic: &mut PicDescriptor) -> Result<(), PicError> {
    ReadRequest::new(path.as_ref()).get_into(pic, Unstoppable)
}

pub fn get_tags_into(path: impl AsRef<Path>, pic: &mut PicDescriptor) -> Result<(), PicError> {
    ReadRequest::new(path.as_ref()).get_tags_into(pic, Unstoppable)
}

pub fn get_into_checked(path: impl AsRef<Path>, pic: &mut PicDescriptor) -> Result<(), PicError> {
    ReadRequest::new(path.as_ref()).get_into_checked(pic, Unstoppable)
}

pub fn get_slice(path: impl AsRef<Path>, slice: u32) -> Result<PicDescriptor, PicError> {
    ReadRequest::new(path.as_ref()).get_slice(slice, Unstoppable)
}

/// Write `pic` uncompressed to `path` and record where its pixels start.
pub fn put(path: impl AsRef<Path>, pic: &mut PicDescriptor) -> Result<(), PicError> {
    let offset = EncodeRequest::new(pic).write_to_path(path, Unstoppable)?;
    pic.pixel_start_offset = offset;
    Ok(())
}

/// Write `pic` as slice `slice` (1-based) of the file at `path`.
pub fn put_slice(path: impl AsRef<Path>, pic: &PicDescriptor, slice: u32) -> Result<(), PicError> {
    EncodeRequest::new(pic).write_slice_to_path(path, slice, Unstoppable)
}
