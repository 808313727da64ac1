//! Input handling systems

use bevy::prelude::*;

use super::components::SimulationControl;

/// Handle basic keyboard input
pub fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut control: ResMut<SimulationControl>,
    mut exit: MessageWriter<AppExit>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        control.paused = !control.paused;
        info!("Simulation {}", if control.paused { "paused" } else { "resumed" });
    }
}
