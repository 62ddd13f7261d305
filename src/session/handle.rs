use crate::env;
use crate::session::types::Handle;
use rand::Rng;
use rand::distr::Alphanumeric;

/// Source of new session handles
///
/// Handles are record keys and selectors; they must not be derived from the
/// identity they point at.
pub trait HandleGenerator: Send + Sync {
    fn generate(&self) -> Handle;
}

/// Random alphanumeric handles drawn from the thread-local CSPRNG
#[derive(Debug, Clone)]
pub struct RandomHandles {
    length: usize,
}

impl RandomHandles {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomHandles {
    fn default() -> Self {
        Self::new(env::session::DEFAULT_HANDLE_LENGTH)
    }
}

impl HandleGenerator for RandomHandles {
    fn generate(&self) -> Handle {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

impl<F> HandleGenerator for F
where
    F: Fn() -> Handle + Send + Sync,
{
    fn generate(&self) -> Handle {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_handles_have_fixed_length() {
        let generator = RandomHandles::default();
        for _ in 0..50 {
            let handle = generator.generate();
            assert_eq!(handle.len(), 4);
            assert!(handle.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_random_handles_vary() {
        let generator = RandomHandles::new(12);
        let handles: HashSet<_> = (0..100).map(|_| generator.generate()).collect();
        assert_eq!(handles.len(), 100);
    }

    #[test]
    fn test_zero_length_is_clamped() {
        assert_eq!(RandomHandles::new(0).generate().len(), 1);
    }

    #[test]
    fn test_closure_generator() {
        let generator = || "fixed".to_string();
        assert_eq!(generator.generate(), "fixed");
    }
}
