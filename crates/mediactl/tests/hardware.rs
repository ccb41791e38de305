// SPDX-License-Identifier: Apache-2.0
//
// Media Controller Hardware Integration Tests
//
// These tests need a real media controller device (a camera pipeline on an
// embedded board, or a kernel with vimc/vivid loaded). They are ignored by
// default:
//
//   cargo test --test hardware -- --ignored --nocapture
//
// `serial` keeps tests from racing each other on the shared device node.

use mediactl::{InfoField, MediaDevice, SubDevice, VideoDevice};
use serial_test::serial;

const MEDIA_NODE: &str = "/dev/media0";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_open_and_print_device_info() {
    init_logging();
    let device = MediaDevice::open(MEDIA_NODE).expect("open /dev/media0");
    let info = device.info();
    println!(
        "driver {} model \"{}\" bus {} media {}",
        info.driver, info.model, info.bus_info, info.media_version
    );
    assert!(!info.driver.is_empty());
    assert!(!info.model.is_empty());
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_graph_is_fully_navigable() {
    init_logging();
    let device = MediaDevice::open(MEDIA_NODE).expect("open /dev/media0");
    let graph = device.graph();
    assert!(!graph.entities().is_empty());

    // Every relationship the resolver promises must hold on real data.
    for pad in graph.pads() {
        let entity = graph.entity_of(pad).expect("pad owner resolvable");
        assert!(entity.pad_ids().contains(&pad.id()));
    }
    for link in graph.links() {
        graph.source(link).expect("source endpoint resolvable");
        graph.sink(link).expect("sink endpoint resolvable");
    }
    for entity in graph.entities() {
        if let Some(iface) = graph.interface_of(entity) {
            println!("{} -> {}", entity.name(), iface.dev_path().display());
        }
    }
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_refresh_is_stable() {
    init_logging();
    let mut device = MediaDevice::open(MEDIA_NODE).expect("open /dev/media0");
    let entities = device.graph().entities().len();
    device.refresh().expect("refresh");
    assert_eq!(device.graph().entities().len(), entities);
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_discovery_wildcard_finds_a_device() {
    init_logging();
    let device =
        MediaDevice::open_matching(InfoField::Driver, "*").expect("any media device matches *");
    assert!(!device.info().driver.is_empty());
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_subdev_formats_readable() {
    init_logging();
    let device = MediaDevice::open(MEDIA_NODE).expect("open /dev/media0");
    let graph = device.graph();

    for entity in graph.entities() {
        let Some(iface) = graph.interface_of(entity) else {
            continue;
        };
        if iface.is_subdev() {
            let subdev = SubDevice::from_entity(graph, entity).expect("open subdev node");
            for pad in graph.pads_of(entity) {
                if let Ok(fmt) = subdev.format(mediactl::subdev::Which::Active, pad.index(), 0) {
                    println!(
                        "{} pad {}: {}x{} code 0x{:04x}",
                        entity.name(),
                        pad.index(),
                        fmt.width,
                        fmt.height,
                        fmt.code
                    );
                }
            }
            let routes = subdev.routes().expect("routing query");
            println!("{}: {} routes", entity.name(), routes.len());
        } else if iface.is_video() {
            let video = VideoDevice::from_entity(graph, entity).expect("open video node");
            let fmt = video.capture_format().expect("capture format");
            println!("{}: {}x{}", entity.name(), fmt.width, fmt.height);
        }
    }
}

#[test]
#[ignore = "requires a media controller device (run with --ignored on hardware)"]
#[serial]
fn test_control_enumeration() {
    init_logging();
    let device = MediaDevice::open(MEDIA_NODE).expect("open /dev/media0");
    let graph = device.graph();

    for entity in graph.entities() {
        let Some(iface) = graph.interface_of(entity) else {
            continue;
        };
        if !iface.is_subdev() {
            continue;
        }
        let subdev = SubDevice::from_entity(graph, entity).expect("open subdev node");
        let classes = mediactl::controls::enumerate_controls(&subdev).expect("enumerate");
        for class in &classes {
            println!("{}: class {}", entity.name(), class.name);
            for control in &class.controls {
                println!(
                    "  0x{:08x} {} ({})",
                    control.id,
                    control.name,
                    control.control_type.name()
                );
            }
        }
    }
}
