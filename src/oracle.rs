//! The similarity oracle abstraction (§4.3).
//!
//! The core never computes a score itself; it is handed a function from a
//! pair of node ids to a finite `f32`, higher meaning more similar. This
//! module supplies the trait plus a default, vector-store-backed
//! implementation built on the crate's existing SIMD kernels
//! ([`crate::distance`]), so the rest of the crate (and its tests) have
//! something concrete to exercise without pulling in a real index.

use crate::{EmbeddingKey, Error, NodeId};

/// Raw distance/similarity kernel, unchanged in spirit from the teacher
/// crate's original `DistanceFn` trait: a `Copy`, thread-safe function from
/// two equal-length vectors to a scalar. Note the sign convention is
/// kernel-specific (Euclidean: lower is closer; cosine/dot: higher is
/// closer) — [`LinearAlgorithm::score`] normalizes that into the
/// higher-is-better convention §3 requires everywhere else in this crate.
pub trait DistanceFn: Send + Sync + Copy {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

/// Selects which SIMD kernel in [`crate::distance`] backs a scorer.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinearAlgorithm {
    EuclideanDistance,
    CosineSimilarity,
    DotProductSimilarity,
}

impl DistanceFn for LinearAlgorithm {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            LinearAlgorithm::EuclideanDistance => crate::distance::euclidean_distance(a, b),
            LinearAlgorithm::CosineSimilarity => crate::distance::cosine_similarity(a, b),
            LinearAlgorithm::DotProductSimilarity => crate::distance::dot_product(a, b),
        }
    }
}

impl LinearAlgorithm {
    /// Higher-is-more-similar score for this kernel (§3's ordering
    /// convention). Euclidean distance is negated; cosine/dot already sort
    /// the right way.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            LinearAlgorithm::EuclideanDistance => -self.distance(a, b),
            LinearAlgorithm::CosineSimilarity | LinearAlgorithm::DotProductSimilarity => {
                self.distance(a, b)
            }
        }
    }
}

/// Abstract pair-scoring capability consumed by the merge/diversity/set
/// machinery (§4.3, §6). Implementations own whatever "vector store" they
/// need; the core only ever asks for a score between two already-known node
/// ids.
pub trait SimilarityOracle: Send + Sync {
    /// Score for the ordered pair `(a, b)`. Symmetry is not required.
    /// Must be deterministic for a given pair.
    fn score(&self, a: NodeId, b: NodeId) -> Result<f32, Error>;

    /// Whether scores from this oracle are safe to use for diversity
    /// decisions (§4.3). Approximate/lossy oracles must report `false`; the
    /// diversity filter is only correct against an exact scorer.
    fn is_exact(&self) -> bool {
        true
    }
}

/// Validates an oracle score is finite, per the `ScoreNaN` contract (§7).
pub(crate) fn finite_or_err(a: NodeId, b: NodeId, score: f32) -> Result<f32, Error> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(Error::ScoreNaN { a, b })
    }
}

/// The crate's default exact scorer: indexes into an in-memory slice of
/// [`EmbeddingKey`]s by [`NodeId`] (treating the id as an ordinal) and scores
/// pairs with one of the SIMD kernels. This is the "vector store used only
/// indirectly through the oracle" §6 describes; a real index would swap this
/// for its own storage layer without the neighbor-set core noticing.
#[derive(Debug, Clone, Copy)]
pub struct VectorOracle<'a, D: DistanceFn = LinearAlgorithm> {
    vectors: &'a [EmbeddingKey],
    algorithm: D,
}

impl<'a, D: DistanceFn> VectorOracle<'a, D> {
    pub fn new(vectors: &'a [EmbeddingKey], algorithm: D) -> Self {
        Self { vectors, algorithm }
    }

    fn vector(&self, node: NodeId) -> &EmbeddingKey {
        &self.vectors[node.0 as usize]
    }
}

impl<'a> SimilarityOracle for VectorOracle<'a, LinearAlgorithm> {
    #[tracing::instrument(skip_all, fields(a = %a, b = %b))]
    fn score(&self, a: NodeId, b: NodeId) -> Result<f32, Error> {
        let score = self
            .algorithm
            .score(self.vector(a).as_slice(), self.vector(b).as_slice());
        finite_or_err(a, b, score)
    }
}

/// Wraps an exact oracle to simulate a cheaper, lossy scorer — e.g. one
/// backed by a product-quantized representation. This crate does not
/// implement quantization itself (§1's Non-goals); this wrapper truncates
/// score precision to stand in for "cheaper but lossy" in tests and
/// benchmarks that need to exercise the exact-vs-approximate distinction in
/// §4.3 without a real PQ decoder.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateOracle<O> {
    inner: O,
    /// Number of bits of score precision retained; lower is lossier.
    precision_bits: u32,
}

impl<O: SimilarityOracle> ApproximateOracle<O> {
    pub fn new(inner: O, precision_bits: u32) -> Self {
        Self {
            inner,
            precision_bits,
        }
    }

    fn quantize(&self, score: f32) -> f32 {
        let scale = (1u64 << self.precision_bits.min(23)) as f32;
        (score * scale).round() / scale
    }
}

impl<O: SimilarityOracle> SimilarityOracle for ApproximateOracle<O> {
    fn score(&self, a: NodeId, b: NodeId) -> Result<f32, Error> {
        self.inner.score(a, b).map(|s| self.quantize(s))
    }

    fn is_exact(&self) -> bool {
        false
    }
}
