use crate::document::{Document, Synthesizer};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use uuid::Uuid;

/// A group of documents handed to one bulk write.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Unique batch ID (for log correlation)
    pub batch_id: Uuid,

    /// Wall-clock time at which generation of this batch began
    pub generated_at: DateTime<Utc>,

    /// Documents in generation order (order carries no meaning downstream)
    pub documents: Vec<Document>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Builds batches of a fixed size from a shared [`Synthesizer`].
///
/// Each assembler owns its random generator, so several assemblers can share
/// one synthesizer without any synchronization.
pub struct BatchAssembler {
    synthesizer: Arc<Synthesizer>,
    rng: StdRng,
    batch_size: usize,
}

impl BatchAssembler {
    pub fn new(synthesizer: Arc<Synthesizer>, batch_size: usize) -> Self {
        Self::with_rng(synthesizer, batch_size, StdRng::from_entropy())
    }

    /// Assembler with an explicit generator, for reproducible output
    pub fn with_rng(synthesizer: Arc<Synthesizer>, batch_size: usize, rng: StdRng) -> Self {
        Self {
            synthesizer,
            rng,
            batch_size,
        }
    }

    /// Assemble a batch stamped with the current time
    pub fn assemble(&mut self) -> Batch {
        self.assemble_at(Utc::now())
    }

    pub fn assemble_at(&mut self, generated_at: DateTime<Utc>) -> Batch {
        let documents = (0..self.batch_size)
            .map(|_| self.synthesizer.synthesize(&mut self.rng, generated_at))
            .collect();

        Batch {
            batch_id: Uuid::new_v4(),
            generated_at,
            documents,
        }
    }
}
