use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum HFError
{
    #[error("refinement percentage must be between 0 and 1, got {0}")]
    InvalidRefinementPercentage(f64),
    #[error("extension has {found} entries but the basis has {expected} dimensions")]
    ExtensionDimensionMismatch { expected: usize, found: usize },
    #[error("smoothing parameter must be finite and non-negative, got {0}")]
    InvalidSmoothingParameter(f64),
    #[error("parameter value lies outside of the domain")]
    OutOfDomain,
    #[error("expected {expected} values but got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("samples must carry at least one output value")]
    NoOutputs,
    #[error("break points must be strictly increasing with at least two entries")]
    InvalidBreakPoints,
    #[error("malformed refinement box")]
    InvalidBox,
    #[error("numerical failure while fitting")]
    NumericalFailure,
    #[error("errors requested before any fit was computed")]
    NotFitted,
    #[error("serialization failed")]
    SerializationFailed,
    #[error("deserialization failed")]
    DeserializationFailed,
    #[error("LZ4 decompression failed")]
    LZ4DecompressionFailed,
    #[error("could not open file")]
    FileIOError,
    #[error("could not read buffer")]
    ReadBufferFailed,
    #[error("could not write buffer")]
    WriteBufferFailed,
}
