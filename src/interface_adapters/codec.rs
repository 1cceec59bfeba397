//! Binary snapshot codec for [`World`].
//!
//! All numbers are little-endian. Layout:
//!
//! ```text
//! "SLWD" | version u8 | gravity f64 | boundary (f64, f64) | object_count u64 | object*
//! object  = id i32 | type u8 | client u8 | size | velocity | position | anchor
//!           | gravity_factor f64 | impulse
//! impulse = 0u8                                  end of chain
//!         | 1u8 | direction | damping f64 | impulse   node followed by its successor
//! ```
//!
//! Objects are written in ascending id order so equal worlds encode to equal bytes.
//! Only physics state travels; scheduler bookkeeping is rebuilt on the receiving side.

use std::fmt;
use std::io::{self, Read};

use crate::domain::{Impulse, ImpulseChain, Object, ObjectType, Vector, World};

pub const MAGIC: [u8; 4] = *b"SLWD";
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 8 + 16 + 8;
// id, type, client flag, four vectors, gravity factor, chain terminator.
const MIN_OBJECT_LEN: usize = 4 + 1 + 1 + 4 * 16 + 8 + 1;

/// Errors produced while decoding a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer does not start with the snapshot magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion { found: u8 },
    /// The buffer ended in the middle of a record.
    Truncated,
    /// An object carries a type tag outside the known categories.
    UnknownObjectType { tag: u8 },
    /// A boolean or presence byte was neither 0 nor 1.
    InvalidFlag { field: &'static str, value: u8 },
    /// Bytes remain after the last object.
    TrailingBytes { count: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "invalid snapshot magic"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported snapshot version {found}")
            }
            Self::Truncated => write!(f, "snapshot is truncated"),
            Self::UnknownObjectType { tag } => write!(f, "unknown object type tag {tag}"),
            Self::InvalidFlag { field, value } => {
                write!(f, "invalid {field} flag {value}")
            }
            Self::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes after snapshot")
            }
        }
    }
}

impl std::error::Error for CodecError {}

// Reading from a byte slice only fails at the end of input.
impl From<io::Error> for CodecError {
    fn from(_: io::Error) -> Self {
        CodecError::Truncated
    }
}

// ── Encoding ────────────────────────────────────────────────────

/// Serializes `world` into a self-contained snapshot buffer.
pub fn encode(world: &World) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + world.len() * MIN_OBJECT_LEN);
    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    write_f64(&mut buf, world.gravity);
    write_vector(&mut buf, world.boundary);

    let mut objects: Vec<&Object> = world.objects().collect();
    objects.sort_unstable_by_key(|object| object.id);

    // Lossless: usize never exceeds 64 bits (checked below).
    write_u64(&mut buf, objects.len() as u64);
    for object in objects {
        write_object(&mut buf, object);
    }
    buf
}

fn write_object(buf: &mut Vec<u8>, object: &Object) {
    buf.extend_from_slice(&object.id.to_le_bytes());
    buf.push(object.kind.tag());
    buf.push(u8::from(object.client_created));
    write_vector(buf, object.size);
    write_vector(buf, object.velocity);
    write_vector(buf, object.position);
    write_vector(buf, object.anchor);
    write_f64(buf, object.gravity_factor);
    write_impulses(buf, &object.impulses);
}

fn write_impulses(buf: &mut Vec<u8>, chain: &ImpulseChain) {
    for impulse in chain.iter() {
        buf.push(1);
        write_vector(buf, impulse.direction);
        write_f64(buf, impulse.damping);
    }
    buf.push(0);
}

fn write_vector(buf: &mut Vec<u8>, vector: Vector) {
    write_f64(buf, vector.x);
    write_f64(buf, vector.y);
}

fn write_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

const _: () = assert!(usize::BITS <= u64::BITS);

fn write_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

// ── Decoding ────────────────────────────────────────────────────

/// Rebuilds a world from a snapshot produced by [`encode`].
///
/// An empty buffer means "no world" and yields `Ok(None)`. Any malformed input
/// is rejected as a whole; no partially decoded world is ever returned.
pub fn decode(bytes: &[u8]) -> Result<Option<World>, CodecError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let mut r = bytes;
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::InvalidMagic);
    }
    let version = read_u8(&mut r)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }

    let gravity = read_f64(&mut r)?;
    let boundary = read_vector(&mut r)?;
    let mut world = World::new(gravity, boundary);

    let count = usize::try_from(read_u64(&mut r)?).map_err(|_| CodecError::Truncated)?;
    if count.saturating_mul(MIN_OBJECT_LEN) > r.len() {
        return Err(CodecError::Truncated);
    }
    for _ in 0..count {
        // Duplicate ids resolve last-wins, keeping keys equal to ids.
        world.upsert(read_object(&mut r)?);
    }

    if !r.is_empty() {
        return Err(CodecError::TrailingBytes { count: r.len() });
    }
    Ok(Some(world))
}

fn read_object(r: &mut &[u8]) -> Result<Object, CodecError> {
    let id = read_i32(r)?;
    let tag = read_u8(r)?;
    let kind = ObjectType::from_tag(tag).ok_or(CodecError::UnknownObjectType { tag })?;
    let client_created = read_flag(r, "client")?;

    Ok(Object {
        id,
        kind,
        client_created,
        size: read_vector(r)?,
        velocity: read_vector(r)?,
        position: read_vector(r)?,
        anchor: read_vector(r)?,
        gravity_factor: read_f64(r)?,
        impulses: read_impulses(r)?,
    })
}

// Nested records are read in a loop, so chain length never grows the stack.
fn read_impulses(r: &mut &[u8]) -> Result<ImpulseChain, CodecError> {
    let mut nodes = Vec::new();
    while read_flag(r, "impulse")? {
        let direction = read_vector(r)?;
        let damping = read_f64(r)?;
        nodes.push(Impulse::new(direction, damping));
    }
    Ok(nodes.into_iter().collect())
}

fn read_flag(r: &mut &[u8], field: &'static str) -> Result<bool, CodecError> {
    match read_u8(r)? {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(CodecError::InvalidFlag { field, value }),
    }
}

fn read_vector(r: &mut &[u8]) -> Result<Vector, CodecError> {
    Ok(Vector::new(read_f64(r)?, read_f64(r)?))
}

fn read_u8(r: &mut &[u8]) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u64(r: &mut &[u8]) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i32(r: &mut &[u8]) -> Result<i32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64(r: &mut &[u8]) -> Result<f64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}
