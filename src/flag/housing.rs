// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::engine::{Context, Manifold, StartFunc, StartFuture};
use crate::errors::WorkerError;
use crate::traits::Flag;

impl Manifold {
    /// Runs this manifold only while every named flag reads `true`.
    ///
    /// The flags become inputs. A flag reading `false` makes the start attempt
    /// fail with [`WorkerError::Missing`], so the manifold sits idle until a
    /// flag is republished with a new value.
    pub fn gated_by<I, S>(self, flags: I) -> Manifold
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let flags: Vec<String> = flags.into_iter().map(Into::into).collect();
        let mut inputs = self.inputs;
        for flag in &flags {
            if !inputs.contains(flag) {
                inputs.push(flag.clone());
            }
        }

        let gate: Arc<[String]> = flags.into();
        let inner = self.start;
        let start: StartFunc = Arc::new(move |ctx: Context| -> StartFuture {
            let gate = Arc::clone(&gate);
            let inner = Arc::clone(&inner);
            Box::pin(async move {
                for name in gate.iter() {
                    let flag: Arc<dyn Flag> = ctx.get(name)?;
                    if !flag.check() {
                        return Err(WorkerError::Missing);
                    }
                }
                inner(ctx).await
            })
        });

        Manifold {
            inputs,
            start,
            output: self.output,
            filter: self.filter,
            fingerprint: self.fingerprint,
        }
    }
}
