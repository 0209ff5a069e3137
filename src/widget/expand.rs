use crate::error::EngineError;
use crate::page::driver::{Key, PageDriver};
use crate::page::wait::{wait_for, Timing};

/// Where an expanded widget's option surface shows up. Menus are often
/// portal-rendered outside the trigger's subtree, so this is checked
/// document-wide. Bare `option` tags are deliberately absent: those belong
/// to native selects (which are never expanded by this protocol), and an
/// enlarged select elsewhere on the page would otherwise read as this
/// widget being open.
pub const OPTION_SURFACE_SELECTOR: &str =
    "[role=\"option\"], li[class*=\"option\"], div[class*=\"option\"], [class*=\"select__option\"], [class*=\"menu-item\"]";

/// How a widget ended up expanded, for the trace log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionOutcome {
    AlreadyOpen,
    Opened(ActivationTechnique),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationTechnique {
    SpaceKey,
    EnterKey,
    ArrowDownKey,
    PointerClick,
}

impl ActivationTechnique {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationTechnique::SpaceKey => "space-key",
            ActivationTechnique::EnterKey => "enter-key",
            ActivationTechnique::ArrowDownKey => "arrow-down-key",
            ActivationTechnique::PointerClick => "pointer-click",
        }
    }
}

const TECHNIQUES: &[ActivationTechnique] = &[
    ActivationTechnique::SpaceKey,
    ActivationTechnique::EnterKey,
    ActivationTechnique::ArrowDownKey,
    ActivationTechnique::PointerClick,
];

/// Open a collapsed custom widget so its options materialize.
///
/// Four activation techniques are attempted in order against the focusable
/// sub-element (the inner text input when the widget has one, else the
/// container): Space, Enter, ArrowDown, then a pointer click. Each attempt
/// gets a short settle window watched through the mutation fast path; the
/// first success short-circuits the rest. A global budget bounds the whole
/// protocol, and one unconditional check runs before giving up, so this
/// function terminates even if no mutation is ever observed.
pub fn expand_widget(
    driver: &mut dyn PageDriver,
    focus_selector: &str,
    timing: &Timing,
) -> Result<ExpansionOutcome, EngineError> {
    if options_visible(driver)? {
        return Ok(ExpansionOutcome::AlreadyOpen);
    }

    let mut spent: u64 = 0;
    for &technique in TECHNIQUES {
        if spent >= timing.expand_budget_ms {
            break;
        }

        let acted = match technique {
            ActivationTechnique::SpaceKey => driver.press_key(focus_selector, Key::Space)?,
            ActivationTechnique::EnterKey => driver.press_key(focus_selector, Key::Enter)?,
            ActivationTechnique::ArrowDownKey => driver.press_key(focus_selector, Key::ArrowDown)?,
            ActivationTechnique::PointerClick => driver.click(focus_selector)?,
        };
        if !acted {
            continue;
        }

        let window = timing.attempt_settle_ms.min(timing.expand_budget_ms - spent);
        let outcome = wait_for(driver, window, timing.poll_ms, true, |d| options_visible(d))?;
        spent += outcome.waited_ms;
        if outcome.satisfied {
            return Ok(ExpansionOutcome::Opened(technique));
        }
    }

    // Final unconditional check before giving up.
    if options_visible(driver)? {
        return Ok(ExpansionOutcome::AlreadyOpen);
    }
    Ok(ExpansionOutcome::TimedOut)
}

fn options_visible(driver: &mut dyn PageDriver) -> Result<bool, EngineError> {
    driver.query_visible(OPTION_SURFACE_SELECTOR)
}

/// Native selects are not expanded by simulated interaction; enlarging
/// their visible size makes every option inspectable without opening the
/// picker.
pub fn enlarge_native_select(
    driver: &mut dyn PageDriver,
    selector: &str,
    option_count: usize,
) -> Result<(), EngineError> {
    let size = option_count.clamp(2, 10);
    driver.set_attribute(selector, "size", &size.to_string())?;
    Ok(())
}
