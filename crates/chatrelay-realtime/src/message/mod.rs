//! Wire format: the envelope schema, its classification, and the frames
//! the server originates.

pub mod builder;
pub mod classifier;
pub mod envelope;
pub mod serializer;

pub use builder::{OutboundFrame, ReactionAction};
pub use classifier::{Disposition, classify};
pub use envelope::{Envelope, EnvelopeKind};
pub use serializer::{FrameError, decode_envelope, encode_frame};
