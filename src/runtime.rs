// Control loop: command intake, gait playback, state publishing
//
// Commands arrive over zenoh as plain text words. Between every emitted
// sub-phase the subscriber is drained non-blockingly and only the newest
// command is kept (single-slot mailbox; a stop or speed change takes
// effect at the next sub-phase boundary, never mid-frame). The gait's
// settle delay is the only pacing while walking; an interval tick paces
// the idle loop.

use std::time::Duration;

use tokio::time::{interval, sleep};
use tracing::{info, warn};

use crate::config::{LOOP_HZ, MAESTRO_PORT, TOPIC_CMD_GAIT, TOPIC_HEALTH, TOPIC_RT_JOINTS};
use crate::gait::GaitSequencer;
use crate::kinematics::HexGeometry;
use crate::messages::{GaitCommand, JointState, RuntimeHealth};
use crate::servo::ServoDriver;

pub struct RuntimeOptions {
    /// Serial port for the Maestro servo controller
    pub port: String,
    /// Drive real hardware; false computes and publishes frames only
    pub motors: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            port: MAESTRO_PORT.to_string(),
            motors: true,
        }
    }
}

pub async fn run(opts: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_GAIT).await?;
    let pub_joints = session.declare_publisher(TOPIC_RT_JOINTS).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut driver = if opts.motors {
        let mut d = ServoDriver::new(&opts.port)?;
        d.initialize()?;
        Some(d)
    } else {
        info!("Motors disabled, frames will be computed and published only");
        None
    };

    let mut gait = GaitSequencer::new(HexGeometry::standard());
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    let mut health = RuntimeHealth::Idle;

    info!("Runtime started, listening on {}", TOPIC_CMD_GAIT);
    info!("Publishing to: {}, {}", TOPIC_RT_JOINTS, TOPIC_HEALTH);

    loop {
        // 1. Drain all pending commands (non-blocking), keep the newest
        let mut latest: Option<GaitCommand> = None;
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            let text = String::from_utf8_lossy(&payload);
            match text.parse::<GaitCommand>() {
                Ok(cmd) => latest = Some(cmd),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }
        if let Some(cmd) = latest {
            info!("Received command: {:?}", cmd);
            // A fresh command clears a sticky fault
            health = RuntimeHealth::Idle;
            gait.apply(cmd);
        }

        // 2. Advance the gait by one sub-phase
        match gait.next_frame() {
            Ok(Some(frame)) => {
                health = RuntimeHealth::Walking;
                if let Some(driver) = driver.as_mut()
                    && let Err(e) = driver.set_leg_angles(&frame.angles)
                {
                    // Fail stationary: abort the step, keep the last
                    // commanded angles in place
                    warn!("Actuation fault: {}, aborting step", e);
                    gait.abort_step();
                    health = RuntimeHealth::Fault;
                }

                // After a fault, abort_step rolled the gait back; publish
                // the angles actually standing, not the rejected frame
                let joints = serde_json::to_string(&JointState::from(gait.last_angles()))?;
                pub_joints.put(joints).await?;
                pub_health.put(serde_json::to_string(&health)?).await?;

                // 3. Settle before the next sub-phase
                sleep(frame.settle).await;
            }
            Ok(None) => {
                if health == RuntimeHealth::Walking {
                    health = RuntimeHealth::Idle;
                }
                pub_health.put(serde_json::to_string(&health)?).await?;
                tick.tick().await;
            }
            Err(e) => {
                warn!("Gait fault: {}", e);
                health = RuntimeHealth::Fault;
                pub_health.put(serde_json::to_string(&health)?).await?;
                tick.tick().await;
            }
        }
    }
}
