use rand::Rng;

use crate::{codec::EncodingMode, error::WriteError, Result};

/// Bases drawn by [`Policy::RandomDraw`]
const CANONICAL: &[u8; 4] = b"ACGT";

/// What a writer does with a sequence holding symbols the encoding mode cannot pack
///
/// Only symbols rejected by the active [`EncodingMode`] are affected: in four-bit
/// mode an `N` or any other IUPAC code is stored as is, in two-bit mode it is not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    /// Drop the record; the writer logs a warning and reports it as not written
    IgnoreSequence,
    /// Fail with [`WriteError::InvalidNucleotideSequence`]
    #[default]
    BreakOnInvalid,
    /// Replace each invalid symbol with a random canonical base
    RandomDraw,
    SetToA,
    SetToC,
    SetToG,
    SetToT,
}
impl Policy {
    /// Rewrites `sequence` into `ibuf` according to the policy
    ///
    /// `ibuf` is cleared first. Returns `false` if the sequence should be dropped.
    ///
    /// # Errors
    ///
    /// [`WriteError::InvalidNucleotideSequence`] under [`Policy::BreakOnInvalid`].
    pub fn handle<R: Rng>(
        self,
        sequence: &[u8],
        mode: EncodingMode,
        ibuf: &mut Vec<u8>,
        rng: &mut R,
    ) -> Result<bool> {
        ibuf.clear();
        match self {
            Self::IgnoreSequence => Ok(false),
            Self::BreakOnInvalid => Err(WriteError::InvalidNucleotideSequence(
                String::from_utf8_lossy(sequence).into_owned(),
            )
            .into()),
            Self::RandomDraw => {
                ibuf.extend(sequence.iter().map(|&n| {
                    if mode.is_valid_symbol(n) {
                        n
                    } else {
                        CANONICAL[rng.random_range(0..CANONICAL.len())]
                    }
                }));
                Ok(true)
            }
            Self::SetToA | Self::SetToC | Self::SetToG | Self::SetToT => {
                let base = match self {
                    Self::SetToA => b'A',
                    Self::SetToC => b'C',
                    Self::SetToG => b'G',
                    _ => b'T',
                };
                ibuf.extend(
                    sequence
                        .iter()
                        .map(|&n| if mode.is_valid_symbol(n) { n } else { base }),
                );
                Ok(true)
            }
        }
    }
}
