//! Third-party plugin isolation.

mod avian;

pub use self::avian::agent_body;

/// Physics integration for agent bodies. Optional: the avoidance plugin only
/// writes `LinearVelocity` and leaves moving the bodies to whoever owns them.
pub fn plugin(app: &mut bevy::prelude::App) {
    app.add_plugins(avian::plugin);
}
