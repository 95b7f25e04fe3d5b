//! Movement, jumping and door interaction for the player pose.
//!
//! Speeds in [`ControlConfig`] are in tiles, so the same config feels the
//! same on maps with different tile sizes.

use crate::camera::PlayerPose;
use crate::config::ControlConfig;
use crate::world::GridWorld;

/// One frame of input, already reduced to axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    /// +1 forward, -1 back.
    pub forward: f32,
    /// +1 right, -1 left.
    pub strafe: f32,
    /// +1 turns toward +Y.
    pub turn: f32,
    /// +1 looks up.
    pub pitch: f32,
    pub jump: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub pose: PlayerPose,
    vz: f32,
}

impl Player {
    pub fn new(pose: PlayerPose) -> Self {
        Self { pose, vz: 0.0 }
    }

    pub fn on_ground(&self, world: &GridWorld) -> bool {
        self.pose.z <= world.height_at(self.pose.x, self.pose.y) + 1e-3
    }

    pub fn update(&mut self, world: &GridWorld, input: &InputState, controls: &ControlConfig, max_pitch: f32, dt: f32) {
        let t = world.tile_size();

        self.pose.angle += input.turn * controls.turn_speed * dt;
        self.pose.wrap_angle();
        self.pose.pitch = (self.pose.pitch + input.pitch * controls.pitch_speed * dt).clamp(-max_pitch, max_pitch);

        let (mut fwd, mut strafe) = (input.forward, input.strafe);
        let len = (fwd * fwd + strafe * strafe).sqrt();
        if len > 1.0 {
            fwd /= len;
            strafe /= len;
        }
        if fwd != 0.0 || strafe != 0.0 {
            let [c, s] = self.pose.forward();
            // Right of the heading is a quarter turn toward +Y.
            let step = controls.move_speed * t * dt;
            let dx = (c * fwd - s * strafe) * step;
            let dy = (s * fwd + c * strafe) * step;
            let radius = controls.radius * t;

            // Axis by axis, so walls can be slid along.
            if !world.blocks_movement(self.pose.x + dx, self.pose.y, radius) {
                self.pose.x += dx;
            }
            if !world.blocks_movement(self.pose.x, self.pose.y + dy, radius) {
                self.pose.y += dy;
            }
        }

        let ground = world.height_at(self.pose.x, self.pose.y);
        if input.jump && self.on_ground(world) {
            self.pose.z = self.pose.z.max(ground);
            self.vz = controls.jump_speed * t;
        }
        self.vz -= controls.gravity * t * dt;
        self.pose.z += self.vz * dt;
        if self.pose.z <= ground {
            self.pose.z = ground;
            self.vz = 0.0;
        }
    }

    /// Toggles the first door within reach straight ahead. Returns the
    /// door cell and its new state. A door is not closed on top of the
    /// player.
    pub fn interact(&self, world: &mut GridWorld, radius: f32) -> Option<(i32, i32, bool)> {
        let t = world.tile_size();
        let [c, s] = self.pose.forward();
        for reach in [0.5, 1.0, 1.5] {
            let (x, y) = world.cell_of(self.pose.x + c * reach * t, self.pose.y + s * reach * t);
            let Some(open) = world.toggle_door(x, y) else {
                continue;
            };
            if !open && world.blocks_movement(self.pose.x, self.pose.y, radius * t) {
                world.set_door(x, y, true);
                return None;
            }
            return Some((x, y, open));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SlopeDir;

    const T: f32 = 64.0;

    fn room() -> GridWorld {
        let rows = vec![
            vec![1, 1, 1, 1, 1, 1],
            vec![1, 0, 0, 1001, 0, 1],
            vec![1, 0, 0, 1, 1, 1],
            vec![1, 1, 1, 1, 1, 1],
        ];
        GridWorld::from_levels(T, &[rows]).unwrap()
    }

    fn forward() -> InputState {
        InputState {
            forward: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn walls_stop_movement() {
        let world = room();
        let mut p = Player::new(PlayerPose::new(1.5 * T, 2.5 * T, 0.0));
        let controls = ControlConfig::default();
        for _ in 0..120 {
            p.update(&world, &forward(), &controls, 100.0, 1.0 / 30.0);
        }
        // Wall at x = 3 tiles, radius 0.2 tiles.
        assert!(p.pose.x < 3.0 * T - 0.19 * T);
        assert!(p.pose.x > 2.5 * T);
        assert_eq!(p.pose.y, 2.5 * T);
    }

    #[test]
    fn closed_door_blocks_and_open_door_passes() {
        let mut world = room();
        let controls = ControlConfig::default();
        let mut p = Player::new(PlayerPose::new(1.5 * T, 1.5 * T, 0.0));
        for _ in 0..90 {
            p.update(&world, &forward(), &controls, 100.0, 1.0 / 30.0);
        }
        // Stopped in front of the door cell, never inside it.
        assert!(p.pose.x <= 2.8 * T + 0.01, "x = {}", p.pose.x);
        assert_eq!(world.cell_of(p.pose.x, p.pose.y), (2, 1));

        assert_eq!(p.interact(&mut world, controls.radius), Some((3, 1, true)));
        for _ in 0..90 {
            p.update(&world, &forward(), &controls, 100.0, 1.0 / 30.0);
        }
        assert!(p.pose.x > 3.5 * T);
    }

    #[test]
    fn jump_lands_back_on_the_ground() {
        let world = room();
        let controls = ControlConfig::default();
        let mut p = Player::new(PlayerPose::new(1.5 * T, 1.5 * T, 0.0));
        let jump = InputState {
            jump: true,
            ..Default::default()
        };
        p.update(&world, &jump, &controls, 100.0, 1.0 / 60.0);
        assert!(p.pose.z > 0.0);
        let mut peak = p.pose.z;
        for _ in 0..120 {
            p.update(&world, &InputState::default(), &controls, 100.0, 1.0 / 60.0);
            peak = peak.max(p.pose.z);
        }
        assert!(peak > 0.5 * T);
        assert_eq!(p.pose.z, 0.0);
        assert!(p.on_ground(&world));
    }

    #[test]
    fn ramps_lift_the_player() {
        let mut world = room();
        world.set_slope(2, 2, SlopeDir::RisePosX);
        let controls = ControlConfig::default();
        let mut p = Player::new(PlayerPose::new(2.75 * T, 2.5 * T, 0.0));
        p.update(&world, &InputState::default(), &controls, 100.0, 1.0 / 60.0);
        assert!((p.pose.z - 0.75 * T).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped() {
        let world = room();
        let controls = ControlConfig::default();
        let mut p = Player::new(PlayerPose::new(1.5 * T, 1.5 * T, 0.0));
        let up = InputState {
            pitch: 1.0,
            ..Default::default()
        };
        for _ in 0..100 {
            p.update(&world, &up, &controls, 50.0, 0.1);
        }
        assert_eq!(p.pose.pitch, 50.0);
    }
}
