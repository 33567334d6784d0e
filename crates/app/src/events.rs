//! Settings change events and the fixed reactions to them

/// One named settings change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsEvent {
    MaxImageSizeChanged(f32),
    ShowDebugInfoChanged(bool),
    FogEnabledChanged(bool),
    FogRevealSizeChanged(f32),
    TargetDisplayChanged(i32),
    OffsetChanged { x: i32, y: i32 },
    InstallContextMenuChanged(bool),
}

/// Work the application performs in response to a settings event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Re-run overlay placement on the (possibly new) target display
    RepositionOverlay,
    /// Restore full fog coverage
    ResetFog,
    /// Follow the enable-fog setting
    ToggleFog,
    /// Push the new reveal diameter into the fog engine
    UpdateRevealSize,
    /// Rebuild the overlay debug text
    RefreshDebugInfo,
    /// Write the settings file
    Persist,
}

/// Reactions for `event`, in the order they run
pub fn reactions_for(event: &SettingsEvent) -> &'static [Reaction] {
    use Reaction::*;

    match event {
        SettingsEvent::MaxImageSizeChanged(_) => &[Persist],
        SettingsEvent::ShowDebugInfoChanged(_) => &[RefreshDebugInfo, Persist],
        SettingsEvent::FogEnabledChanged(_) => &[ToggleFog, Persist],
        SettingsEvent::FogRevealSizeChanged(_) => &[UpdateRevealSize, Persist],
        SettingsEvent::TargetDisplayChanged(_) | SettingsEvent::OffsetChanged { .. } => {
            &[RepositionOverlay, ResetFog, RefreshDebugInfo, Persist]
        }
        // Shell integration lives outside this program; only the flag is stored
        SettingsEvent::InstallContextMenuChanged(_) => &[Persist],
    }
}
