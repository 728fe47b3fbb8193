//! Presentation seam: transient prompts, animation triggers, notifications
//!
//! The combat core never touches widgets or animation clips directly; it
//! drives this trait and the host engine renders whatever it likes.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::UnitId;
use crate::skill::definition::SkillDefId;

/// The transient prompts the skill flow can put on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptKind {
    /// Confirm/return pair after a target is picked
    Confirm,
    /// "Continue with a chained attack?" yes/no
    ComboJudge,
    /// Chained-skill picker (no skip option under a `Must` policy)
    ComboSelect,
}

pub trait Presenter {
    fn show_confirm(&mut self, unit: UnitId);
    fn show_combo_judge(&mut self, unit: UnitId);
    fn show_combo_select(&mut self, unit: UnitId, candidates: &[SkillDefId]);
    fn destroy_prompt(&mut self, unit: UnitId, kind: PromptKind);
    /// Trigger the animation keyed by an integer id; 0 resets the channel
    fn play_animation(&mut self, unit: UnitId, anim_id: i32);
    fn skill_complete(&mut self, unit: UnitId);
    /// User-visible message (e.g. "not enough chakra")
    fn notify(&mut self, unit: UnitId, message: &str);
}

/// Call made on a [`RecordingPresenter`]
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    ShowConfirm(UnitId),
    ShowComboJudge(UnitId),
    ShowComboSelect(UnitId, Vec<SkillDefId>),
    DestroyPrompt(UnitId, PromptKind),
    PlayAnimation(UnitId, i32),
    SkillComplete(UnitId),
    Notify(UnitId, String),
}

/// Presenter double that records every call; used by tests and the demo
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub calls: Vec<PresenterCall>,
    open: AHashSet<(UnitId, PromptKind)>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompts currently on screen for the unit
    pub fn open_prompts(&self, unit: UnitId) -> Vec<PromptKind> {
        self.open
            .iter()
            .filter(|(u, _)| *u == unit)
            .map(|(_, k)| *k)
            .collect()
    }

    pub fn animations_played(&self, unit: UnitId) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PresenterCall::PlayAnimation(u, id) if *u == unit => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn show_confirm(&mut self, unit: UnitId) {
        self.open.insert((unit, PromptKind::Confirm));
        self.calls.push(PresenterCall::ShowConfirm(unit));
    }

    fn show_combo_judge(&mut self, unit: UnitId) {
        self.open.insert((unit, PromptKind::ComboJudge));
        self.calls.push(PresenterCall::ShowComboJudge(unit));
    }

    fn show_combo_select(&mut self, unit: UnitId, candidates: &[SkillDefId]) {
        self.open.insert((unit, PromptKind::ComboSelect));
        self.calls
            .push(PresenterCall::ShowComboSelect(unit, candidates.to_vec()));
    }

    fn destroy_prompt(&mut self, unit: UnitId, kind: PromptKind) {
        self.open.remove(&(unit, kind));
        self.calls.push(PresenterCall::DestroyPrompt(unit, kind));
    }

    fn play_animation(&mut self, unit: UnitId, anim_id: i32) {
        self.calls.push(PresenterCall::PlayAnimation(unit, anim_id));
    }

    fn skill_complete(&mut self, unit: UnitId) {
        self.calls.push(PresenterCall::SkillComplete(unit));
    }

    fn notify(&mut self, unit: UnitId, message: &str) {
        self.calls
            .push(PresenterCall::Notify(unit, message.to_string()));
    }
}
