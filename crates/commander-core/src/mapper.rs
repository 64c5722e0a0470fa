/// Argument errors raised by the batch mapping operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapperError {
    #[error("sources must not be absent")]
    MissingSources,

    #[error("sources and targets must not be absent")]
    MissingSourcesOrTargets,

    #[error("sources and targets must be same size: {sources} != {targets}")]
    LengthMismatch { sources: usize, targets: usize },
}

/// Mapping between a source type `S` and a target type `T`
///
/// Implementors provide the single-item operations; the batch operations
/// are derived from them. An absent sequence (`None`) is an argument error
/// rather than an empty batch.
pub trait BeanMapper<S, T> {
    /// Produce a new target from `source`
    fn map(&self, source: &S) -> T;

    /// Overwrite `target` in place from `source`
    fn map_to(&self, source: &S, target: &mut T);

    /// Map every source into a new target, preserving order
    fn map_all(&self, sources: Option<&[S]>) -> Result<Vec<T>, MapperError> {
        let sources = sources.ok_or(MapperError::MissingSources)?;
        Ok(sources.iter().map(|source| self.map(source)).collect())
    }

    /// Update `targets[i]` from `sources[i]` for every `i`
    ///
    /// Nothing is touched unless both sequences are present and of equal length.
    fn map_all_to(&self, sources: Option<&[S]>, targets: Option<&mut [T]>) -> Result<(), MapperError> {
        let (Some(sources), Some(targets)) = (sources, targets) else {
            return Err(MapperError::MissingSourcesOrTargets);
        };

        if sources.len() != targets.len() {
            return Err(MapperError::LengthMismatch {
                sources: sources.len(),
                targets: targets.len(),
            });
        }

        for (source, target) in sources.iter().zip(targets.iter_mut()) {
            self.map_to(source, target);
        }

        Ok(())
    }
}
