// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! One-time lexer initialization

use async_trait::async_trait;
use require_cjs_lexer::CjsLexer;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Produces the CommonJS export lexer. Called at most once per gate.
#[async_trait]
pub trait LexerFactory: Send + Sync {
    /// Build a ready-to-use lexer.
    async fn create(&self) -> CjsLexer;
}

/// Factory for the built-in token lexer
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLexerFactory;

#[async_trait]
impl LexerFactory for DefaultLexerFactory {
    async fn create(&self) -> CjsLexer {
        CjsLexer::new()
    }
}

/// Lazily initialized lexer shared by every classification.
///
/// Concurrent first callers all await the same initialization.
pub struct LexerGate {
    factory: Arc<dyn LexerFactory>,
    lexer: OnceCell<CjsLexer>,
}

impl LexerGate {
    /// Create an uninitialized gate.
    pub fn new(factory: Arc<dyn LexerFactory>) -> Self {
        Self {
            factory,
            lexer: OnceCell::new(),
        }
    }

    /// The lexer, initializing it on first use.
    pub async fn get(&self) -> &CjsLexer {
        self.lexer
            .get_or_init(|| async {
                debug!("initializing CommonJS lexer");
                self.factory.create().await
            })
            .await
    }

    /// Whether initialization has completed
    pub fn is_initialized(&self) -> bool {
        self.lexer.initialized()
    }
}

impl Default for LexerGate {
    fn default() -> Self {
        Self::new(Arc::new(DefaultLexerFactory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowFactory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LexerFactory for SlowFactory {
        async fn create(&self) -> CjsLexer {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            CjsLexer::new()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_initializes_once() {
        let factory = Arc::new(SlowFactory {
            calls: AtomicUsize::new(0),
        });
        let gate = Arc::new(LexerGate::new(factory.clone()));
        assert!(!gate.is_initialized());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    gate.get().await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(gate.is_initialized());
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);

        gate.get().await;
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }
}
