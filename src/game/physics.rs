//! Player movement with obstacle-aware collision

use crate::config::GameConfig;

use super::obstacles::ObstacleField;
use super::player::{InputState, Player};

/// Physics system for moving players
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Integrate one tick of input into a player's position.
    ///
    /// Each axis is resolved separately (Y first, then X) and only the axis
    /// that ends up inside an obstacle is reverted, so players slide along
    /// walls instead of sticking to them. Players never collide with each other.
    pub fn step_player(
        player: &mut Player,
        input: &InputState,
        dt: f32,
        obstacles: &ObstacleField,
        config: &GameConfig,
    ) {
        if !player.alive {
            return;
        }

        let size = config.player_size;
        let speed = config.player_speed * dt;

        player.angle = input.angle;

        let old_y = player.y;
        if input.up {
            player.y -= speed;
        }
        if input.down {
            player.y += speed;
        }
        if obstacles.collides(player.x, player.y, size) {
            player.y = old_y;
        }

        let old_x = player.x;
        if input.left {
            player.x -= speed;
        }
        if input.right {
            player.x += speed;
        }
        if obstacles.collides(player.x, player.y, size) {
            player.x = old_x;
        }

        let half = size / 2.0;
        player.x = player.x.clamp(half, config.world_width - half);
        player.y = player.y.clamp(half, config.world_height - half);
    }

    /// Check if a point is inside a circle
    pub fn is_in_zone(x: f32, y: f32, zone_center_x: f32, zone_center_y: f32, zone_radius: f32) -> bool {
        let dx = x - zone_center_x;
        let dy = y - zone_center_y;
        dx * dx + dy * dy <= zone_radius * zone_radius
    }

    /// Check overlap between two circles (strict, touching does not count)
    pub fn circles_overlap(x1: f32, y1: f32, x2: f32, y2: f32, combined_radius: f32) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        dx * dx + dy * dy < combined_radius * combined_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::obstacles::Obstacle;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn player_at(x: f32, y: f32, config: &GameConfig) -> Player {
        let field = ObstacleField::from_obstacles(Vec::new(), config.world_width, config.world_height);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut player = Player::spawn(Uuid::from_u128(1), Some("Mover"), &field, config, &mut rng);
        player.x = x;
        player.y = y;
        player
    }

    fn input(up: bool, down: bool, left: bool, right: bool) -> InputState {
        InputState {
            up,
            down,
            left,
            right,
            angle: 1.25,
        }
    }

    #[test]
    fn test_free_movement_and_facing() {
        let config = GameConfig::default();
        let field = ObstacleField::from_obstacles(Vec::new(), config.world_width, config.world_height);
        let mut player = player_at(500.0, 500.0, &config);

        PhysicsSystem::step_player(&mut player, &input(false, true, false, true), 0.1, &field, &config);

        assert_eq!(player.x, 525.0);
        assert_eq!(player.y, 525.0);
        assert_eq!(player.angle, 1.25);
    }

    #[test]
    fn test_dead_player_does_not_move() {
        let config = GameConfig::default();
        let field = ObstacleField::from_obstacles(Vec::new(), config.world_width, config.world_height);
        let mut player = player_at(500.0, 500.0, &config);
        player.alive = false;

        PhysicsSystem::step_player(&mut player, &input(true, false, true, false), 0.1, &field, &config);

        assert_eq!((player.x, player.y), (500.0, 500.0));
        assert_eq!(player.angle, 0.0);
    }

    #[test]
    fn test_position_clamped_to_world() {
        let config = GameConfig::default();
        let field = ObstacleField::from_obstacles(Vec::new(), config.world_width, config.world_height);
        let mut player = player_at(20.0, config.world_height - 20.0, &config);

        PhysicsSystem::step_player(&mut player, &input(false, true, true, false), 1.0, &field, &config);

        assert_eq!(player.x, 16.0);
        assert_eq!(player.y, config.world_height - 16.0);
    }

    #[test]
    fn test_slides_along_wall_when_one_axis_blocked() {
        let config = GameConfig::default();
        // Wall directly to the right of the player
        let wall = Obstacle {
            x: 520.0,
            y: 300.0,
            width: 100.0,
            height: 400.0,
        };
        let field = ObstacleField::from_obstacles(vec![wall], config.world_width, config.world_height);
        let mut player = player_at(500.0, 500.0, &config);

        // Moving diagonally up-right: X is blocked, Y is free
        PhysicsSystem::step_player(&mut player, &input(true, false, false, true), 0.1, &field, &config);

        assert_eq!(player.x, 500.0);
        assert_eq!(player.y, 475.0);
        assert!(!field.collides(player.x, player.y, config.player_size));
    }

    #[test]
    fn test_slides_along_floor_when_y_blocked() {
        let config = GameConfig::default();
        // Floor directly below the player
        let floor = Obstacle {
            x: 300.0,
            y: 520.0,
            width: 400.0,
            height: 100.0,
        };
        let field = ObstacleField::from_obstacles(vec![floor], config.world_width, config.world_height);
        let mut player = player_at(500.0, 500.0, &config);

        PhysicsSystem::step_player(&mut player, &input(false, true, true, false), 0.1, &field, &config);

        assert_eq!(player.y, 500.0);
        assert_eq!(player.x, 475.0);
    }

    #[test]
    fn test_random_walk_never_enters_obstacles() {
        use rand::Rng;

        let config = GameConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let field = ObstacleField::generate(&mut rng, config.world_width, config.world_height);
        let (x, y) = field.find_spawn(&mut rng, config.player_size);
        let mut player = player_at(x, y, &config);
        let started_clear = !field.collides(x, y, config.player_size);
        let half = config.player_size / 2.0;

        for _ in 0..2000 {
            let keys = input(rng.gen(), rng.gen(), rng.gen(), rng.gen());
            PhysicsSystem::step_player(&mut player, &keys, 1.0 / 60.0, &field, &config);

            assert!(player.x >= half && player.x <= config.world_width - half);
            assert!(player.y >= half && player.y <= config.world_height - half);
            if started_clear {
                assert!(!field.collides(player.x, player.y, config.player_size));
            }
        }
    }

    #[test]
    fn test_zone_and_overlap_checks() {
        assert!(PhysicsSystem::is_in_zone(3.0, 4.0, 0.0, 0.0, 5.0));
        assert!(!PhysicsSystem::is_in_zone(3.0, 4.1, 0.0, 0.0, 5.0));
        assert!(PhysicsSystem::circles_overlap(0.0, 0.0, 19.9, 0.0, 20.0));
        assert!(!PhysicsSystem::circles_overlap(0.0, 0.0, 20.0, 0.0, 20.0));
    }
}
