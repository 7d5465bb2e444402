//! Worker-local copy of the policy.
use anyhow::Result;
use log::debug;
use swarm_core::{Model, ParamSource, Policy};

/// A worker-local model kept in sync with the learner through a [`ParamSource`].
///
/// Parameters are only replaced by [`PolicyReplica::refresh`], which applies
/// a whole snapshot at once; inference in between always sees a single
/// published version.
pub struct PolicyReplica<M: Model> {
    model: M,
    source: ParamSource,
    version: Option<u64>,
}

impl<M: Model> PolicyReplica<M> {
    /// Wraps `model`. No parameters are pulled until the first refresh.
    pub fn new(model: M, source: ParamSource) -> Self {
        Self {
            model,
            source,
            version: None,
        }
    }

    /// Pulls the latest snapshot if its version differs from the applied one.
    ///
    /// Returns `true` if parameters were replaced.
    pub fn refresh(&mut self) -> Result<bool> {
        if self.version == Some(self.source.version()) {
            return Ok(false);
        }
        let snapshot = self.source.latest();
        self.model.apply_params(snapshot.params())?;
        self.version = Some(snapshot.version());
        debug!(
            "Applied parameters of version {} ({} opt steps)",
            snapshot.version(),
            snapshot.opt_steps()
        );
        Ok(true)
    }

    /// Version of the applied snapshot, `None` before the first refresh.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// The wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: Model> Policy for PolicyReplica<M> {
    fn infer_action(&self, state: &[f32]) -> Vec<f32> {
        self.model.infer_action(state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;
    use swarm_core::{
        dummy::{LinearPolicy, LinearPolicyConfig},
        param_channel, ParamSnapshot,
    };
    use test_log::test;

    fn model() -> LinearPolicy {
        LinearPolicy::build(&LinearPolicyConfig::default()).unwrap()
    }

    #[test]
    fn test_refresh_skips_same_version() -> Result<()> {
        let model = model();
        let n = model.params().len();
        let (mut publisher, source) = param_channel(ParamSnapshot::new(0, 0, vec![0.0; n]));
        let mut replica = PolicyReplica::new(model, source);

        assert_eq!(replica.version(), None);
        assert!(replica.refresh()?);
        assert_eq!(replica.version(), Some(0));
        assert!(!replica.refresh()?);

        publisher.publish(vec![0.5; n], 1);
        assert!(replica.refresh()?);
        assert_eq!(replica.version(), Some(1));
        assert_eq!(replica.model().params(), vec![0.5; n]);
        Ok(())
    }

    #[test]
    fn test_refresh_rejects_wrong_length() {
        let (_publisher, source) = param_channel(ParamSnapshot::new(0, 0, vec![0.0; 1]));
        let mut replica = PolicyReplica::new(model(), source);
        assert!(replica.refresh().is_err());
        assert_eq!(replica.version(), None);
    }

    #[test]
    fn test_refresh_under_concurrent_publisher() -> Result<()> {
        let n = model().params().len();
        let n_publish = 300u64;
        let (mut publisher, source) = param_channel(ParamSnapshot::new(0, 0, vec![0.0; n]));

        let reader = thread::spawn(move || -> Result<()> {
            let mut replica = PolicyReplica::new(model(), source);
            loop {
                replica.refresh()?;
                let v = replica.version().unwrap_or(0);
                assert!(replica.model().params().iter().all(|&p| p == v as f32));
                if v == n_publish {
                    return Ok(());
                }
            }
        });
        for v in 1..=n_publish {
            publisher.publish(vec![v as f32; n], v as usize);
        }
        reader.join().unwrap()
    }
}
