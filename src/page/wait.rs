use crate::error::EngineError;
use crate::page::driver::PageDriver;

// ============================================================================
// Timing knobs
// ============================================================================

/// Upper bounds and poll intervals for every suspend point in the engine.
/// Overridable from `formfill.yaml`.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Poll interval for bounded waits.
    pub poll_ms: u64,
    /// Settle delay after each widget activation technique.
    pub attempt_settle_ms: u64,
    /// Total expansion budget per widget container.
    pub expand_budget_ms: u64,
    /// How long fill-back waits for a custom dropdown's options to appear.
    pub option_wait_ms: u64,
    /// Hard ceiling for the external-autofill settle wait.
    pub settle_max_wait_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_ms: 40,
            attempt_settle_ms: 80,
            expand_budget_ms: 600,
            option_wait_ms: 400,
            settle_max_wait_ms: 8000,
        }
    }
}

// ============================================================================
// Bounded predicate wait
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    pub satisfied: bool,
    pub waited_ms: u64,
}

/// Wait until `predicate` holds or `budget_ms` elapses. Never hangs and
/// never fails on timeout: the outcome reports whether the predicate was
/// eventually satisfied.
///
/// With `fast_path` the predicate is only re-run after the document's
/// mutation counter moved (appropriate when the awaited condition implies a
/// tree mutation, e.g. an option list appearing). Without it the predicate
/// runs every poll, which is what value-change tracking needs, since value
/// assignments don't always surface as tree mutations.
///
/// One final unconditional check runs at the deadline either way.
pub fn wait_for(
    driver: &mut dyn PageDriver,
    budget_ms: u64,
    poll_ms: u64,
    fast_path: bool,
    mut predicate: impl FnMut(&mut dyn PageDriver) -> Result<bool, EngineError>,
) -> Result<WaitOutcome, EngineError> {
    if predicate(driver)? {
        return Ok(WaitOutcome { satisfied: true, waited_ms: 0 });
    }

    let poll = poll_ms.max(1);
    let mut elapsed: u64 = 0;
    let mut last_version = driver.dom_version()?;

    while elapsed < budget_ms {
        let step = poll.min(budget_ms - elapsed);
        driver.wait(step)?;
        elapsed += step;

        if fast_path {
            let version = driver.dom_version()?;
            if version == last_version {
                continue;
            }
            last_version = version;
        }

        if predicate(driver)? {
            return Ok(WaitOutcome { satisfied: true, waited_ms: elapsed });
        }
    }

    // Final check at the deadline, regardless of mutation activity.
    let satisfied = predicate(driver)?;
    Ok(WaitOutcome { satisfied, waited_ms: elapsed })
}
