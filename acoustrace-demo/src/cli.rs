use crate::house::{self, HouseTracer};
use acoustrace::{
    AcousticEngine, AcousticEngineDesc, AcousticEvent, AcousticSource, DetailLevel, Importance,
    MaterialTable, Pose, SourceFlags, SourceHandle, SourceSettings, Vec3,
};
use anyhow::Result;
use std::sync::Arc;

const FRAME_DT: f32 = 1.0 / 30.0;

struct Emitter {
    name: &'static str,
    location: Vec3,
    settings: SourceSettings,
}

impl AcousticSource for Emitter {
    fn location(&self) -> Vec3 {
        self.location
    }

    fn settings(&self) -> SourceSettings {
        self.settings.clone()
    }
}

fn emitter(name: &'static str, location: Vec3, settings: SourceSettings) -> Arc<Emitter> {
    Arc::new(Emitter {
        name,
        location,
        settings,
    })
}

/// Walks a listener from the kitchen through the doorway into the hall,
/// closing the door behind them, and logs what each source sounds like.
pub fn run_walkthrough() -> Result<()> {
    log::info!("=== Walkthrough: kitchen -> hall ===");

    let mut engine = AcousticEngine::new(
        AcousticEngineDesc::default(),
        HouseTracer::new(),
        MaterialTable::with_presets(),
    )?;
    engine.register_zone(house::kitchen());
    engine.register_zone(house::hall());
    let door = engine.register_portal(house::door());

    let sources = vec![
        emitter(
            "radio",
            Vec3::new(-900.0, 50.0, -300.0),
            SourceSettings::default()
                .with_detail_level(DetailLevel::Hero)
                .with_flags(SourceFlags::HERO),
        ),
        emitter(
            "fridge",
            Vec3::new(-1100.0, -200.0, 400.0),
            SourceSettings::default()
                .with_detail_level(DetailLevel::Basic)
                .with_importance(Importance::Background)
                .with_flags(SourceFlags::LARGE_SOURCE | SourceFlags::ALWAYS_AUDIBLE),
        ),
        emitter(
            "clock",
            Vec3::new(1000.0, 150.0, 500.0),
            SourceSettings::default().with_base_loudness(0.6),
        ),
        emitter(
            "street",
            Vec3::new(9000.0, 0.0, 0.0),
            SourceSettings::default().with_importance(Importance::Important),
        ),
        emitter(
            "doorbell",
            Vec3::new(1150.0, 100.0, 0.0),
            SourceSettings::default()
                .with_importance(Importance::Critical)
                .with_flags(SourceFlags::NEVER_OCCLUDE),
        ),
    ];

    let handles: Vec<(SourceHandle, &'static str)> = sources
        .iter()
        .map(|s| (engine.register(s.clone()), s.name))
        .collect();

    let remote = engine.handle();
    let frames = 150;
    for frame in 0..frames {
        let t = frame as f32 / frames as f32;
        let position = Vec3::new(-800.0 + 1600.0 * t, 0.0, 0.0);
        let mut pose = Pose::from_position(position);
        pose.look_at(position + Vec3::X);
        remote.update_listener(0, pose)?;

        if frame == 100 {
            log::info!("Closing the door");
            remote.set_portal_open(door, false)?;
        }

        engine.tick(FRAME_DT);

        for event in engine.poll_events() {
            match event {
                AcousticEvent::ZoneChanged {
                    listener_index,
                    old_zone,
                    new_zone,
                } => {
                    let name = |id| engine.zone(id).map_or("outside", |z| z.name());
                    log::info!(
                        "Listener {} moved from {} to {}",
                        listener_index,
                        old_zone.map_or("outside", name),
                        new_zone.map_or("outside", name)
                    );
                }
                AcousticEvent::PortalSettled { portal, openness } => {
                    log::info!("Portal {} settled at openness {:.2}", portal, openness);
                }
                _ => {}
            }
        }

        if frame % 30 == 29 {
            report(&engine, &handles);
        }
    }

    let preset = engine.current_zone_preset(0);
    log::info!(
        "Final reverb: {:?} rt60 {:.2}s, send {:.2}",
        preset.zone_type,
        preset.rt60,
        preset.default_reverb_send
    );
    Ok(())
}

fn report(engine: &AcousticEngine, handles: &[(SourceHandle, &'static str)]) {
    let stats = engine.last_frame_stats();
    log::info!(
        "Frame {}: {} / {} rays ({} occlusion, {} reflection), {} audible",
        stats.frame,
        stats.budget.total_used,
        stats.budget.total_budget,
        stats.budget.occlusion_rays,
        stats.budget.reflection_rays,
        stats.audible
    );

    for (handle, name) in handles {
        let Some(entry) = engine.entry(*handle) else {
            continue;
        };
        let p = &entry.current_params;
        log::info!(
            "  {:<8} {:?} occ {:.2} lpf {:>7.0} Hz gain {:.2} send {:.2} taps {} dist {:.0}/{:.0}",
            name,
            entry.effective_level,
            p.occlusion,
            p.low_pass_cutoff,
            p.dry_gain,
            p.reverb_send,
            p.early_reflections.valid_tap_count,
            p.distance,
            p.perceived_distance
        );
    }
}

/// Registers far more sources than the budget can serve and shows how
/// the scheduler spreads rays across frames.
pub fn run_budget_stress() -> Result<()> {
    log::info!("=== Budget stress: 240 sources, 120 rays/frame ===");

    let desc = AcousticEngineDesc::default()
        .max_rays_per_frame(120)
        .source_caps(4, 1);
    let mut engine = AcousticEngine::new(desc, HouseTracer::new(), MaterialTable::with_presets())?;
    engine.register_zone(house::kitchen());
    engine.register_zone(house::hall());
    engine.update_listener(0, Pose::from_position(Vec3::new(-600.0, 0.0, 0.0)));

    let mut sources: Vec<Arc<dyn AcousticSource>> = Vec::new();
    let mut handles = Vec::new();
    for i in 0..240 {
        let x = -1150.0 + (i % 24) as f32 * 100.0;
        let z = -550.0 + (i / 24) as f32 * 110.0;
        let level = match i % 10 {
            0 => DetailLevel::Hero,
            1..=4 => DetailLevel::Advanced,
            _ => DetailLevel::Basic,
        };
        let source: Arc<dyn AcousticSource> = emitter(
            "crowd",
            Vec3::new(x, 0.0, z),
            SourceSettings::default().with_detail_level(level),
        );
        handles.push(engine.register(source.clone()));
        sources.push(source);
    }

    let mut traced = 0;
    let mut published = 0;
    for _ in 0..60 {
        engine.tick(FRAME_DT);
        published += engine
            .poll_events()
            .iter()
            .filter(|e| matches!(e, AcousticEvent::ParamsUpdated { .. }))
            .count();
        let stats = engine.last_frame_stats();
        traced += stats.occlusion_updated;
        if stats.frame % 10 == 0 {
            log::info!(
                "Frame {}: used {}/{} rays, occlusion {} (+{} deferred), reflections {} (+{} deferred)",
                stats.frame,
                stats.budget.total_used,
                stats.budget.total_budget,
                stats.occlusion_updated,
                stats.deferred_occlusion,
                stats.reflection_updated,
                stats.deferred_reflection
            );
        }
    }

    let valid = handles
        .iter()
        .filter_map(|h| engine.get_params(*h))
        .filter(|p| p.valid)
        .count();
    log::info!(
        "{} occlusion traces and {} published updates over 60 frames, {} of {} sources have params",
        traced,
        published,
        valid,
        sources.len()
    );
    Ok(())
}
