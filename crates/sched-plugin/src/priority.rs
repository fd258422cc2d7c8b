//! Initial job priority policies.

/// The job fields a priority policy may look at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: u32,
    /// Priority set explicitly by an operator, if any.
    pub direct_priority: Option<u32>,
}

/// Assigns the initial priority of a newly submitted job.
pub trait PriorityPolicy: Send + Sync {
    /// `last_prio` is the priority handed to the previous job.
    fn set_priority(&self, last_prio: u32, job: &JobRecord) -> u32;
}

/// First come, first served: each job gets one less than the job before it,
/// never dropping below 1. An explicitly set priority always wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicPriority;

impl PriorityPolicy for BasicPriority {
    fn set_priority(&self, last_prio: u32, job: &JobRecord) -> u32 {
        if let Some(prio) = job.direct_priority {
            return prio;
        }
        last_prio.saturating_sub(1).max(1)
    }
}

impl<P: PriorityPolicy + ?Sized> PriorityPolicy for &P {
    fn set_priority(&self, last_prio: u32, job: &JobRecord) -> u32 {
        (**self).set_priority(last_prio, job)
    }
}
