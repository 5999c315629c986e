pub mod codec;
pub mod messages;

pub use codec::{decode, encode, header_padding, DecodedMessage, Frame, Message};
pub use messages::{ProgressIndicator, Spectrogram, SpectrogramHeader};
