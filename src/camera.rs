use std::f32::consts::PI;

/// Player state the input/physics side mutates between frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,     // vertical offset above the resting eye height (jump, ramps)
    pub angle: f32, // radians, 0 faces +X, positive turns toward +Y
    pub pitch: f32, // screen rows the horizon is shifted by
}

impl PlayerPose {
    pub fn new(x: f32, y: f32, angle: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            angle,
            pitch: 0.0,
        }
    }

    #[inline]
    pub fn forward(&self) -> [f32; 2] {
        [self.angle.cos(), self.angle.sin()]
    }

    /// Keep the heading in [-pi, pi] to avoid float drift.
    pub fn wrap_angle(&mut self) {
        self.angle = normalize_angle(self.angle);
    }
}

#[inline]
pub fn normalize_angle(mut a: f32) -> f32 {
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Pose plus the projection constants for one framebuffer size.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pose: PlayerPose,
    pub eye_height: f32, // resting eye height above level 0
    pub fov: f32,        // horizontal field of view, radians
    pub view_dist: f32,  // distance to the projection plane, in pixels
    pub width: usize,
    pub height: usize,
}

impl Camera {
    pub fn new(pose: PlayerPose, eye_height: f32, width: usize, height: usize, fov_x_deg: f32) -> Self {
        let mut cam = Self {
            pose,
            eye_height,
            fov: 0.0,
            view_dist: 0.0,
            width,
            height,
        };
        cam.set_fov_from_horizontal(width, height, fov_x_deg);
        cam
    }

    pub fn set_fov_from_horizontal(&mut self, width: usize, height: usize, fov_x_deg: f32) {
        self.width = width;
        self.height = height;
        self.fov = fov_x_deg.to_radians();
        self.view_dist = 0.5 * width as f32 / (0.5 * self.fov).tan();
    }

    /// Eye position above level 0 in world units.
    #[inline]
    pub fn eye_z(&self) -> f32 {
        self.eye_height + self.pose.z
    }

    /// Screen row of the horizon, after pitch.
    #[inline]
    pub fn horizon(&self) -> f32 {
        0.5 * self.height as f32 + self.pose.pitch
    }

    /// Ray angle relative to the heading for a screen column.
    #[inline]
    pub fn column_offset_angle(&self, column: usize) -> f32 {
        let offset = column as f32 - 0.5 * self.width as f32;
        (offset / self.view_dist).atan()
    }

    #[inline]
    pub fn ray_angle(&self, column: usize) -> f32 {
        self.pose.angle + self.column_offset_angle(column)
    }

    /// Screen row of a world height seen at perpendicular distance `dist`.
    #[inline]
    pub fn project_y(&self, world_z: f32, dist: f32) -> f32 {
        self.horizon() + (self.eye_z() - world_z) * (self.view_dist / dist)
    }

    /// Screen column of a direction `angle_diff` radians off the heading.
    #[inline]
    pub fn project_x(&self, angle_diff: f32) -> f32 {
        0.5 * self.width as f32 + angle_diff.tan() * self.view_dist
    }
}
