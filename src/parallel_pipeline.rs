// THEORY:
// The `parallel_pipeline` module lets a host serving many concurrent uploads
// screen them on a fixed pool of workers instead of spawning unbounded tasks.
// A dispatcher task receives `ScreeningTask`s on an unbounded channel and deals
// them round-robin to the workers; each worker replies through the task's
// oneshot channel.
//
// Because the scoring core is pure and stateless, workers hold nothing between
// tasks and the pool adds no ordering constraints: any task may run on any
// worker with bit-identical results. The pool exists purely to bound CPU
// parallelism (default: one worker per logical core).
//
// Each task mirrors the host's control flow: the plausibility gate always
// runs; severity runs only when the task carries a disease class AND the image
// passed the gate.

use crate::core_modules::raster::Raster;
use crate::core_modules::severity::{DiseaseClass, SeverityReport, SeverityTier};
use crate::core_modules::validity::ValidityVerdict;
use crate::pipeline;
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};

/// One image to screen, with the external classifier's label when the caller
/// wants a severity estimate as well.
pub struct ScreeningRequest {
    pub raster: Raster,
    pub disease_class: Option<DiseaseClass>,
}

/// The pool's reply for one request. `severity` is populated only for images
/// that passed the gate on a request carrying a disease class.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningOutcome {
    pub verdict: ValidityVerdict,
    pub severity: Option<(SeverityReport, Option<SeverityTier>)>,
}

struct ScreeningTask {
    request: ScreeningRequest,
    result_sender: oneshot::Sender<ScreeningOutcome>,
}

/// A fixed pool of screening workers fed by a round-robin dispatcher.
pub struct ScreeningPool {
    task_sender: mpsc::UnboundedSender<ScreeningTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl ScreeningPool {
    /// One worker per logical core.
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get().max(1))
    }

    pub fn with_workers(worker_count: usize) -> Self {
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<ScreeningTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count.max(1))
            .map(|_| mpsc::unbounded_channel::<ScreeningTask>())
            .unzip();

        // Dispatcher: deal incoming tasks round-robin across the workers.
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        let mut workers = Vec::with_capacity(worker_count);
        for mut worker_receiver in worker_receivers {
            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let outcome = Self::screen(&task.request);
                    let _ = task.result_sender.send(outcome);
                }
            }));
        }

        Self {
            task_sender,
            workers,
        }
    }

    /// The per-task work: gate first, severity only for accepted images.
    fn screen(request: &ScreeningRequest) -> ScreeningOutcome {
        let verdict = pipeline::check_validity(&request.raster);
        let severity = match (verdict.is_valid, request.disease_class) {
            (true, Some(class)) => Some(pipeline::score_severity(&request.raster, class)),
            _ => None,
        };
        ScreeningOutcome { verdict, severity }
    }

    /// Screens one request on the pool.
    pub async fn process(&self, request: ScreeningRequest) -> Result<ScreeningOutcome, &'static str> {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = ScreeningTask {
            request,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| "Failed to send task to worker pool")?;

        result_receiver
            .await
            .map_err(|_| "Failed to receive result from worker")
    }

    /// Screens a batch of requests concurrently, preserving input order.
    pub async fn screen_batch(
        &self,
        requests: Vec<ScreeningRequest>,
    ) -> Vec<Result<ScreeningOutcome, &'static str>> {
        join_all(requests.into_iter().map(|request| self.process(request))).await
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Default for ScreeningPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::raster::Raster;

    fn radiograph_like_raster() -> Raster {
        let mut plane = Vec::with_capacity(10_000);
        plane.extend(std::iter::repeat_n(20u8, 3_500));
        plane.extend(std::iter::repeat_n(120u8, 4_000));
        plane.extend(std::iter::repeat_n(200u8, 2_500));
        Raster::from_buffer(100, 100, 1, plane).expect("valid raster")
    }

    fn flat_raster() -> Raster {
        Raster::from_buffer(64, 64, 1, vec![128u8; 64 * 64]).expect("valid raster")
    }

    #[tokio::test]
    async fn pool_matches_the_serial_pipeline() {
        let pool = ScreeningPool::with_workers(3);
        assert_eq!(pool.worker_count(), 3);
        let raster = radiograph_like_raster();

        let outcome = pool
            .process(ScreeningRequest {
                raster: raster.clone(),
                disease_class: Some(DiseaseClass::Caries),
            })
            .await
            .expect("pool reply");

        assert_eq!(outcome.verdict, pipeline::check_validity(&raster));
        assert_eq!(
            outcome.severity,
            Some(pipeline::score_severity(&raster, DiseaseClass::Caries))
        );
    }

    #[tokio::test]
    async fn rejected_images_are_never_severity_scored() {
        let pool = ScreeningPool::with_workers(2);
        let outcome = pool
            .process(ScreeningRequest {
                raster: flat_raster(),
                disease_class: Some(DiseaseClass::Fractured),
            })
            .await
            .expect("pool reply");

        assert!(!outcome.verdict.is_valid);
        assert_eq!(outcome.severity, None);
    }

    #[tokio::test]
    async fn batch_replies_preserve_request_order() {
        let pool = ScreeningPool::with_workers(4);
        let requests = vec![
            ScreeningRequest {
                raster: radiograph_like_raster(),
                disease_class: Some(DiseaseClass::Caries),
            },
            ScreeningRequest {
                raster: flat_raster(),
                disease_class: None,
            },
            ScreeningRequest {
                raster: radiograph_like_raster(),
                disease_class: None,
            },
        ];

        let outcomes = pool.screen_batch(requests).await;
        assert_eq!(outcomes.len(), 3);
        let first = outcomes[0].as_ref().expect("pool reply");
        let second = outcomes[1].as_ref().expect("pool reply");
        let third = outcomes[2].as_ref().expect("pool reply");

        assert!(first.verdict.is_valid && first.severity.is_some());
        assert!(!second.verdict.is_valid && second.severity.is_none());
        // Valid image, but no class supplied: gate only.
        assert!(third.verdict.is_valid && third.severity.is_none());
    }
}
