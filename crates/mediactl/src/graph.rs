// SPDX-License-Identifier: Apache-2.0

//! Typed media topology graph.
//!
//! This module turns the flat record arrays of a raw topology snapshot into
//! a navigable object graph. Construction is strictly two-phase:
//!
//! 1. **Build**: one typed wrapper per raw record, carrying only fields
//!    derivable from the record itself (id, decoded name, local flags).
//! 2. **Resolve**: every cross-reference (pad ownership, entity pads and
//!    interface, link endpoints, incident links) is wired up and the graph
//!    invariants are checked.
//!
//! The phases never interleave, so a partially-resolved graph is never
//! observable: either [`MediaGraph::resolve`] returns a fully consistent
//! graph or it fails.
//!
//! All objects live in kind-specific arenas indexed by their kernel-assigned
//! id, which is unique across all four kinds. Relationships are stored as
//! ids and resolved through the arena on access, keeping the graph free of
//! self-references.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use bitflags::bitflags;
use mediactl_sys as sys;

use crate::discover::glob_match;
use crate::topology::RawTopology;
use crate::{devnode, Error};

/// Entity function classification from the kernel's `MEDIA_ENT_F_*` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityFunction {
    Unknown,
    V4l2SubdevUnknown,
    IoV4l,
    IoDtv,
    IoVbi,
    IoSwradio,
    IfVidDecoder,
    IfAudDecoder,
    AudioCapture,
    AudioPlayback,
    AudioMixer,
    VideoComposer,
    VideoPixelFormatter,
    VideoPixelEncConv,
    VideoLut,
    VideoScaler,
    VideoStatistics,
    VideoEncoder,
    VideoDecoder,
    VideoIsp,
    VidMux,
    VidIfBridge,
    CamSensor,
    Flash,
    Lens,
    AtvDecoder,
    Tuner,
    DtvDemod,
    TsDemux,
    DtvCa,
    DtvNetDecap,
    /// A function code this library does not classify.
    Other(u32),
}

impl EntityFunction {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            sys::MEDIA_ENT_F_UNKNOWN => EntityFunction::Unknown,
            sys::MEDIA_ENT_F_V4L2_SUBDEV_UNKNOWN => EntityFunction::V4l2SubdevUnknown,
            sys::MEDIA_ENT_F_IO_V4L => EntityFunction::IoV4l,
            sys::MEDIA_ENT_F_IO_DTV => EntityFunction::IoDtv,
            sys::MEDIA_ENT_F_IO_VBI => EntityFunction::IoVbi,
            sys::MEDIA_ENT_F_IO_SWRADIO => EntityFunction::IoSwradio,
            sys::MEDIA_ENT_F_IF_VID_DECODER => EntityFunction::IfVidDecoder,
            sys::MEDIA_ENT_F_IF_AUD_DECODER => EntityFunction::IfAudDecoder,
            sys::MEDIA_ENT_F_AUDIO_CAPTURE => EntityFunction::AudioCapture,
            sys::MEDIA_ENT_F_AUDIO_PLAYBACK => EntityFunction::AudioPlayback,
            sys::MEDIA_ENT_F_AUDIO_MIXER => EntityFunction::AudioMixer,
            sys::MEDIA_ENT_F_PROC_VIDEO_COMPOSER => EntityFunction::VideoComposer,
            sys::MEDIA_ENT_F_PROC_VIDEO_PIXEL_FORMATTER => EntityFunction::VideoPixelFormatter,
            sys::MEDIA_ENT_F_PROC_VIDEO_PIXEL_ENC_CONV => EntityFunction::VideoPixelEncConv,
            sys::MEDIA_ENT_F_PROC_VIDEO_LUT => EntityFunction::VideoLut,
            sys::MEDIA_ENT_F_PROC_VIDEO_SCALER => EntityFunction::VideoScaler,
            sys::MEDIA_ENT_F_PROC_VIDEO_STATISTICS => EntityFunction::VideoStatistics,
            sys::MEDIA_ENT_F_PROC_VIDEO_ENCODER => EntityFunction::VideoEncoder,
            sys::MEDIA_ENT_F_PROC_VIDEO_DECODER => EntityFunction::VideoDecoder,
            sys::MEDIA_ENT_F_PROC_VIDEO_ISP => EntityFunction::VideoIsp,
            sys::MEDIA_ENT_F_VID_MUX => EntityFunction::VidMux,
            sys::MEDIA_ENT_F_VID_IF_BRIDGE => EntityFunction::VidIfBridge,
            sys::MEDIA_ENT_F_CAM_SENSOR => EntityFunction::CamSensor,
            sys::MEDIA_ENT_F_FLASH => EntityFunction::Flash,
            sys::MEDIA_ENT_F_LENS => EntityFunction::Lens,
            sys::MEDIA_ENT_F_ATV_DECODER => EntityFunction::AtvDecoder,
            sys::MEDIA_ENT_F_TUNER => EntityFunction::Tuner,
            sys::MEDIA_ENT_F_DTV_DEMOD => EntityFunction::DtvDemod,
            sys::MEDIA_ENT_F_TS_DEMUX => EntityFunction::TsDemux,
            sys::MEDIA_ENT_F_DTV_CA => EntityFunction::DtvCa,
            sys::MEDIA_ENT_F_DTV_NET_DECAP => EntityFunction::DtvNetDecap,
            other => EntityFunction::Other(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityFunction::Unknown => "unknown",
            EntityFunction::V4l2SubdevUnknown => "v4l2-subdev",
            EntityFunction::IoV4l => "v4l-io",
            EntityFunction::IoDtv => "dtv-io",
            EntityFunction::IoVbi => "vbi-io",
            EntityFunction::IoSwradio => "swradio-io",
            EntityFunction::IfVidDecoder => "if-video-decoder",
            EntityFunction::IfAudDecoder => "if-audio-decoder",
            EntityFunction::AudioCapture => "audio-capture",
            EntityFunction::AudioPlayback => "audio-playback",
            EntityFunction::AudioMixer => "audio-mixer",
            EntityFunction::VideoComposer => "video-composer",
            EntityFunction::VideoPixelFormatter => "pixel-formatter",
            EntityFunction::VideoPixelEncConv => "pixel-enc-conv",
            EntityFunction::VideoLut => "video-lut",
            EntityFunction::VideoScaler => "video-scaler",
            EntityFunction::VideoStatistics => "video-statistics",
            EntityFunction::VideoEncoder => "video-encoder",
            EntityFunction::VideoDecoder => "video-decoder",
            EntityFunction::VideoIsp => "video-isp",
            EntityFunction::VidMux => "video-mux",
            EntityFunction::VidIfBridge => "video-if-bridge",
            EntityFunction::CamSensor => "camera-sensor",
            EntityFunction::Flash => "flash",
            EntityFunction::Lens => "lens",
            EntityFunction::AtvDecoder => "atv-decoder",
            EntityFunction::Tuner => "tuner",
            EntityFunction::DtvDemod => "dtv-demod",
            EntityFunction::TsDemux => "ts-demux",
            EntityFunction::DtvCa => "dtv-ca",
            EntityFunction::DtvNetDecap => "dtv-net-decap",
            EntityFunction::Other(_) => "other",
        }
    }
}

impl fmt::Display for EntityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Interface type from the kernel's `MEDIA_INTF_T_*` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    V4lVideo,
    V4lVbi,
    V4lRadio,
    V4lSubdev,
    V4lSwradio,
    V4lTouch,
    DvbFe,
    DvbDemux,
    DvbDvr,
    DvbCa,
    DvbNet,
    AlsaPcmCapture,
    AlsaPcmPlayback,
    AlsaControl,
    Other(u32),
}

impl InterfaceType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            sys::MEDIA_INTF_T_V4L_VIDEO => InterfaceType::V4lVideo,
            sys::MEDIA_INTF_T_V4L_VBI => InterfaceType::V4lVbi,
            sys::MEDIA_INTF_T_V4L_RADIO => InterfaceType::V4lRadio,
            sys::MEDIA_INTF_T_V4L_SUBDEV => InterfaceType::V4lSubdev,
            sys::MEDIA_INTF_T_V4L_SWRADIO => InterfaceType::V4lSwradio,
            sys::MEDIA_INTF_T_V4L_TOUCH => InterfaceType::V4lTouch,
            sys::MEDIA_INTF_T_DVB_FE => InterfaceType::DvbFe,
            sys::MEDIA_INTF_T_DVB_DEMUX => InterfaceType::DvbDemux,
            sys::MEDIA_INTF_T_DVB_DVR => InterfaceType::DvbDvr,
            sys::MEDIA_INTF_T_DVB_CA => InterfaceType::DvbCa,
            sys::MEDIA_INTF_T_DVB_NET => InterfaceType::DvbNet,
            sys::MEDIA_INTF_T_ALSA_PCM_CAPTURE => InterfaceType::AlsaPcmCapture,
            sys::MEDIA_INTF_T_ALSA_PCM_PLAYBACK => InterfaceType::AlsaPcmPlayback,
            sys::MEDIA_INTF_T_ALSA_CONTROL => InterfaceType::AlsaControl,
            other => InterfaceType::Other(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InterfaceType::V4lVideo => "v4l-video",
            InterfaceType::V4lVbi => "v4l-vbi",
            InterfaceType::V4lRadio => "v4l-radio",
            InterfaceType::V4lSubdev => "v4l-subdev",
            InterfaceType::V4lSwradio => "v4l-swradio",
            InterfaceType::V4lTouch => "v4l-touch",
            InterfaceType::DvbFe => "dvb-fe",
            InterfaceType::DvbDemux => "dvb-demux",
            InterfaceType::DvbDvr => "dvb-dvr",
            InterfaceType::DvbCa => "dvb-ca",
            InterfaceType::DvbNet => "dvb-net",
            InterfaceType::AlsaPcmCapture => "alsa-pcm-capture",
            InterfaceType::AlsaPcmPlayback => "alsa-pcm-playback",
            InterfaceType::AlsaControl => "alsa-control",
            InterfaceType::Other(_) => "other",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

bitflags! {
    /// Entity flags (`MEDIA_ENT_FL_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntityFlags: u32 {
        const DEFAULT = sys::MEDIA_ENT_FL_DEFAULT;
        const CONNECTOR = sys::MEDIA_ENT_FL_CONNECTOR;
    }
}

bitflags! {
    /// Pad flags (`MEDIA_PAD_FL_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PadFlags: u32 {
        const SINK = sys::MEDIA_PAD_FL_SINK;
        const SOURCE = sys::MEDIA_PAD_FL_SOURCE;
        const MUST_CONNECT = sys::MEDIA_PAD_FL_MUST_CONNECT;
        const INTERNAL = sys::MEDIA_PAD_FL_INTERNAL;
    }
}

bitflags! {
    /// Link state flags (`MEDIA_LNK_FL_*`, excluding the link-type bits).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LinkFlags: u32 {
        const ENABLED = sys::MEDIA_LNK_FL_ENABLED;
        const IMMUTABLE = sys::MEDIA_LNK_FL_IMMUTABLE;
        const DYNAMIC = sys::MEDIA_LNK_FL_DYNAMIC;
    }
}

/// A functional block in the pipeline (sensor, scaler, I/O device, ...).
#[derive(Debug, Clone)]
pub struct Entity {
    id: u32,
    name: String,
    function: EntityFunction,
    flags: EntityFlags,
    pad_ids: Vec<u32>,
    interface_id: Option<u32>,
    link_ids: Vec<u32>,
}

impl Entity {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> EntityFunction {
        self.function
    }

    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Ids of the pads owned by this entity, in kernel report order.
    pub fn pad_ids(&self) -> &[u32] {
        &self.pad_ids
    }

    /// Id of the attached interface, if the entity has a device node.
    pub fn interface_id(&self) -> Option<u32> {
        self.interface_id
    }

    /// Ids of every link whose source or sink is this entity.
    pub fn link_ids(&self) -> &[u32] {
        &self.link_ids
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity {} \"{}\"", self.id, self.name)
    }
}

/// The device-node association for an entity.
#[derive(Debug, Clone)]
pub struct Interface {
    id: u32,
    intf_type: InterfaceType,
    major: u32,
    minor: u32,
    dev_path: PathBuf,
    link_ids: Vec<u32>,
}

impl Interface {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn interface_type(&self) -> InterfaceType {
        self.intf_type
    }

    pub fn devnode(&self) -> (u32, u32) {
        (self.major, self.minor)
    }

    /// Filesystem path of the device node, resolved at construction time.
    pub fn dev_path(&self) -> &std::path::Path {
        &self.dev_path
    }

    pub fn is_subdev(&self) -> bool {
        self.intf_type == InterfaceType::V4lSubdev
    }

    pub fn is_video(&self) -> bool {
        self.intf_type == InterfaceType::V4lVideo
    }

    pub fn link_ids(&self) -> &[u32] {
        &self.link_ids
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interface {} ({})", self.id, self.dev_path.display())
    }
}

/// A connection point on an entity.
#[derive(Debug, Clone)]
pub struct Pad {
    id: u32,
    entity_id: u32,
    index: u32,
    flags: PadFlags,
    link_ids: Vec<u32>,
}

impl Pad {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Id of the owning entity (always resolvable in the same graph).
    pub fn entity_id(&self) -> u32 {
        self.entity_id
    }

    /// Position of this pad within its entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn flags(&self) -> PadFlags {
        self.flags
    }

    pub fn is_source(&self) -> bool {
        self.flags.contains(PadFlags::SOURCE)
    }

    pub fn is_sink(&self) -> bool {
        self.flags.contains(PadFlags::SINK)
    }

    pub fn is_internal(&self) -> bool {
        self.flags.contains(PadFlags::INTERNAL)
    }

    pub fn link_ids(&self) -> &[u32] {
        &self.link_ids
    }
}

/// A directed connection between two pads, or between an entity and its
/// control interface.
#[derive(Debug, Clone)]
pub struct Link {
    id: u32,
    source_id: u32,
    sink_id: u32,
    flags: u32,
    link_ids: Vec<u32>,
}

impl Link {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn source_id(&self) -> u32 {
        self.source_id
    }

    pub fn sink_id(&self) -> u32 {
        self.sink_id
    }

    /// State flags with the link-type bits masked off.
    pub fn flags(&self) -> LinkFlags {
        LinkFlags::from_bits_truncate(self.flags)
    }

    /// Raw flag word as reported (or last written), including type bits.
    pub fn raw_flags(&self) -> u32 {
        self.flags
    }

    pub fn is_enabled(&self) -> bool {
        self.flags & sys::MEDIA_LNK_FL_ENABLED != 0
    }

    pub fn is_immutable(&self) -> bool {
        self.flags & sys::MEDIA_LNK_FL_IMMUTABLE != 0
    }

    pub fn is_data_link(&self) -> bool {
        self.flags & sys::MEDIA_LNK_FL_LINK_TYPE == sys::MEDIA_LNK_FL_DATA_LINK
    }

    pub fn is_interface_link(&self) -> bool {
        self.flags & sys::MEDIA_LNK_FL_LINK_TYPE == sys::MEDIA_LNK_FL_INTERFACE_LINK
    }

    pub fn link_ids(&self) -> &[u32] {
        &self.link_ids
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link {} ({} -> {})", self.id, self.source_id, self.sink_id)
    }
}

/// A reference to any graph member, type-checked at the use site.
#[derive(Debug, Clone, Copy)]
pub enum Object<'a> {
    Entity(&'a Entity),
    Interface(&'a Interface),
    Pad(&'a Pad),
    Link(&'a Link),
}

impl<'a> Object<'a> {
    pub fn id(&self) -> u32 {
        match self {
            Object::Entity(e) => e.id,
            Object::Interface(i) => i.id,
            Object::Pad(p) => p.id,
            Object::Link(l) => l.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Object::Entity(_) => "entity",
            Object::Interface(_) => "interface",
            Object::Pad(_) => "pad",
            Object::Link(_) => "link",
        }
    }

    pub fn as_entity(self) -> Result<&'a Entity, Error> {
        match self {
            Object::Entity(e) => Ok(e),
            other => Err(Error::TypeMismatch {
                expected: "entity",
                found: other.kind(),
            }),
        }
    }

    pub fn as_interface(self) -> Result<&'a Interface, Error> {
        match self {
            Object::Interface(i) => Ok(i),
            other => Err(Error::TypeMismatch {
                expected: "interface",
                found: other.kind(),
            }),
        }
    }

    pub fn as_pad(self) -> Result<&'a Pad, Error> {
        match self {
            Object::Pad(p) => Ok(p),
            other => Err(Error::TypeMismatch {
                expected: "pad",
                found: other.kind(),
            }),
        }
    }

    pub fn as_link(self) -> Result<&'a Link, Error> {
        match self {
            Object::Link(l) => Ok(l),
            other => Err(Error::TypeMismatch {
                expected: "link",
                found: other.kind(),
            }),
        }
    }
}

/// Arena slot: variant tag plus index into the kind-specific store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Entity(usize),
    Interface(usize),
    Pad(usize),
    Link(usize),
}

/// A fully resolved, immutable topology snapshot.
///
/// Built atomically by [`MediaGraph::resolve`]; a fresh kernel read always
/// produces a whole new graph. Only per-link flag state ever changes after
/// construction (mirrored from successful link setup calls).
#[derive(Debug, Clone)]
pub struct MediaGraph {
    version: u64,
    entities: Vec<Entity>,
    interfaces: Vec<Interface>,
    pads: Vec<Pad>,
    links: Vec<Link>,
    index: HashMap<u32, Slot>,
}

impl MediaGraph {
    /// Resolve a raw topology snapshot into a typed graph, looking up
    /// interface device nodes through sysfs.
    pub fn resolve(raw: &RawTopology) -> Result<Self, Error> {
        Self::resolve_with(raw, &devnode::path_for_devnode)
    }

    /// Resolve with an injectable devnode lookup (the external collaborator
    /// boundary; substituted in tests).
    pub fn resolve_with(
        raw: &RawTopology,
        devnode_lookup: &dyn Fn(u32, u32) -> Result<PathBuf, Error>,
    ) -> Result<Self, Error> {
        // Phase 1: build one wrapper per record. No cross-references yet;
        // ids are checked for global uniqueness as the arena index fills.
        let mut index: HashMap<u32, Slot> = HashMap::new();

        let insert = |index: &mut HashMap<u32, Slot>, id: u32, slot: Slot| {
            if index.insert(id, slot).is_some() {
                return Err(Error::Malformed(format!("duplicate object id {}", id)));
            }
            Ok(())
        };

        let mut entities = Vec::with_capacity(raw.entities.len());
        for e in &raw.entities {
            insert(&mut index, e.id, Slot::Entity(entities.len()))?;
            entities.push(Entity {
                id: e.id,
                name: decode_name(&e.name)?,
                function: EntityFunction::from_raw(e.function),
                flags: EntityFlags::from_bits_truncate(e.flags),
                pad_ids: Vec::new(),
                interface_id: None,
                link_ids: Vec::new(),
            });
        }

        let mut interfaces = Vec::with_capacity(raw.interfaces.len());
        for i in &raw.interfaces {
            insert(&mut index, i.id, Slot::Interface(interfaces.len()))?;
            // An interface is unusable without its device node.
            let dev_path = devnode_lookup(i.devnode.major, i.devnode.minor)?;
            interfaces.push(Interface {
                id: i.id,
                intf_type: InterfaceType::from_raw(i.intf_type),
                major: i.devnode.major,
                minor: i.devnode.minor,
                dev_path,
                link_ids: Vec::new(),
            });
        }

        let mut pads = Vec::with_capacity(raw.pads.len());
        for p in &raw.pads {
            insert(&mut index, p.id, Slot::Pad(pads.len()))?;
            pads.push(Pad {
                id: p.id,
                entity_id: p.entity_id,
                index: p.index,
                flags: PadFlags::from_bits_truncate(p.flags),
                link_ids: Vec::new(),
            });
        }

        let mut links = Vec::with_capacity(raw.links.len());
        for l in &raw.links {
            insert(&mut index, l.id, Slot::Link(links.len()))?;
            links.push(Link {
                id: l.id,
                source_id: l.source_id,
                sink_id: l.sink_id,
                flags: l.flags,
                link_ids: Vec::new(),
            });
        }

        // Phase 2: cross-reference and check invariants.

        // Incident links for every object. O(objects x links); topologies
        // are tens to low hundreds of nodes.
        let incident = |id: u32| -> Vec<u32> {
            raw.links
                .iter()
                .filter(|l| l.source_id == id || l.sink_id == id)
                .map(|l| l.id)
                .collect()
        };
        for entity in entities.iter_mut() {
            entity.link_ids = incident(entity.id);
        }
        for interface in interfaces.iter_mut() {
            interface.link_ids = incident(interface.id);
        }
        for pad in pads.iter_mut() {
            pad.link_ids = incident(pad.id);
        }
        for link in links.iter_mut() {
            link.link_ids = incident(link.id);
        }

        // Every pad belongs to exactly one existing entity.
        for pad in &pads {
            match index.get(&pad.entity_id) {
                Some(Slot::Entity(_)) => {}
                Some(_) => {
                    return Err(Error::Malformed(format!(
                        "pad {} owner id {} is not an entity",
                        pad.id, pad.entity_id
                    )))
                }
                None => {
                    return Err(Error::Malformed(format!(
                        "pad {} references missing entity {}",
                        pad.id, pad.entity_id
                    )))
                }
            }
        }

        // Entity pads and the at-most-one attached interface.
        for entity in entities.iter_mut() {
            entity.pad_ids = raw
                .pads
                .iter()
                .filter(|p| p.entity_id == entity.id)
                .map(|p| p.id)
                .collect();

            let mut iface_ids = Vec::new();
            for raw_link in raw
                .links
                .iter()
                .filter(|l| l.source_id == entity.id || l.sink_id == entity.id)
            {
                for endpoint in [raw_link.source_id, raw_link.sink_id] {
                    if let Some(Slot::Interface(_)) = index.get(&endpoint) {
                        iface_ids.push(endpoint);
                    }
                }
            }
            if iface_ids.len() > 1 {
                return Err(Error::Malformed(format!(
                    "entity {} \"{}\" has {} interfaces",
                    entity.id,
                    entity.name,
                    iface_ids.len()
                )));
            }
            entity.interface_id = iface_ids.first().copied();
        }

        // Both link endpoints resolve to objects in this snapshot.
        for link in &links {
            for (end, id) in [("source", link.source_id), ("sink", link.sink_id)] {
                if !index.contains_key(&id) {
                    return Err(Error::Malformed(format!(
                        "link {} {} references missing object {}",
                        link.id, end, id
                    )));
                }
            }
        }

        log::debug!(
            "resolved graph v{}: {} entities, {} interfaces, {} pads, {} links",
            raw.version,
            entities.len(),
            interfaces.len(),
            pads.len(),
            links.len()
        );

        Ok(MediaGraph {
            version: raw.version,
            entities,
            interfaces,
            pads,
            links,
            index,
        })
    }

    /// Kernel topology version counter of the snapshot this graph was built
    /// from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Look up any object by its id.
    pub fn object(&self, id: u32) -> Result<Object<'_>, Error> {
        match self.index.get(&id) {
            Some(Slot::Entity(i)) => Ok(Object::Entity(&self.entities[*i])),
            Some(Slot::Interface(i)) => Ok(Object::Interface(&self.interfaces[*i])),
            Some(Slot::Pad(i)) => Ok(Object::Pad(&self.pads[*i])),
            Some(Slot::Link(i)) => Ok(Object::Link(&self.links[*i])),
            None => Err(Error::UnknownObject(id)),
        }
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        match self.index.get(&id) {
            Some(Slot::Entity(i)) => Some(&self.entities[*i]),
            _ => None,
        }
    }

    pub fn interface(&self, id: u32) -> Option<&Interface> {
        match self.index.get(&id) {
            Some(Slot::Interface(i)) => Some(&self.interfaces[*i]),
            _ => None,
        }
    }

    pub fn pad(&self, id: u32) -> Option<&Pad> {
        match self.index.get(&id) {
            Some(Slot::Pad(i)) => Some(&self.pads[*i]),
            _ => None,
        }
    }

    pub fn link(&self, id: u32) -> Option<&Link> {
        match self.index.get(&id) {
            Some(Slot::Link(i)) => Some(&self.links[*i]),
            _ => None,
        }
    }

    /// Find the first entity whose name matches a glob-style pattern.
    pub fn find_entity(&self, pattern: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| glob_match(pattern, &e.name))
    }

    /// The pads of an entity, in kernel report order.
    pub fn pads_of(&self, entity: &Entity) -> Vec<&Pad> {
        entity
            .pad_ids
            .iter()
            .filter_map(|id| self.pad(*id))
            .collect()
    }

    /// The interface attached to an entity, if any.
    pub fn interface_of(&self, entity: &Entity) -> Option<&Interface> {
        entity.interface_id.and_then(|id| self.interface(id))
    }

    /// The entity owning a pad.
    pub fn entity_of(&self, pad: &Pad) -> Result<&Entity, Error> {
        self.object(pad.entity_id)?.as_entity()
    }

    /// The source endpoint of a link, as a dynamically typed object.
    pub fn source(&self, link: &Link) -> Result<Object<'_>, Error> {
        self.object(link.source_id)
    }

    /// The sink endpoint of a link, as a dynamically typed object.
    pub fn sink(&self, link: &Link) -> Result<Object<'_>, Error> {
        self.object(link.sink_id)
    }

    /// The source endpoint of a link as a pad; fails with a type mismatch
    /// for interface links.
    pub fn source_pad(&self, link: &Link) -> Result<&Pad, Error> {
        self.source(link)?.as_pad()
    }

    /// The sink endpoint of a link as a pad; fails with a type mismatch for
    /// interface links.
    pub fn sink_pad(&self, link: &Link) -> Result<&Pad, Error> {
        self.sink(link)?.as_pad()
    }

    /// Every link incident on any pad of an entity (its data links).
    pub fn pad_links(&self, entity: &Entity) -> Vec<&Link> {
        self.pads_of(entity)
            .iter()
            .flat_map(|p| p.link_ids.iter())
            .filter_map(|id| self.link(*id))
            .collect()
    }

    /// Mirror a successful link setup into the in-memory state. The flags
    /// are set to exactly what was sent on the wire.
    pub(crate) fn set_link_flags(&mut self, link_id: u32, flags: u32) {
        if let Some(Slot::Link(i)) = self.index.get(&link_id) {
            self.links[*i].flags = flags;
        }
    }
}

/// Decode a fixed-size kernel name field up to the first NUL.
fn decode_name(bytes: &[u8]) -> Result<String, Error> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(std::str::from_utf8(&bytes[..end])?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::RawTopology;

    fn raw_entity(id: u32, name: &str) -> sys::media_v2_entity {
        let mut e = sys::media_v2_entity::default();
        e.id = id;
        e.name[..name.len()].copy_from_slice(name.as_bytes());
        e.function = sys::MEDIA_ENT_F_CAM_SENSOR;
        e
    }

    fn raw_interface(id: u32, intf_type: u32, major: u32, minor: u32) -> sys::media_v2_interface {
        let mut i = sys::media_v2_interface::default();
        i.id = id;
        i.intf_type = intf_type;
        i.devnode.major = major;
        i.devnode.minor = minor;
        i
    }

    fn raw_pad(id: u32, entity_id: u32, index: u32, flags: u32) -> sys::media_v2_pad {
        let mut p = sys::media_v2_pad::default();
        p.id = id;
        p.entity_id = entity_id;
        p.index = index;
        p.flags = flags;
        p
    }

    fn raw_link(id: u32, source_id: u32, sink_id: u32, flags: u32) -> sys::media_v2_link {
        let mut l = sys::media_v2_link::default();
        l.id = id;
        l.source_id = source_id;
        l.sink_id = sink_id;
        l.flags = flags;
        l
    }

    fn fake_devnode(major: u32, minor: u32) -> Result<PathBuf, Error> {
        Ok(PathBuf::from(format!("/dev/fake-{}-{}", major, minor)))
    }

    /// Sensor (entity 1, source pad 10) -> capture (entity 2, sink pad 11),
    /// one enabled data link.
    fn simple_pipeline() -> RawTopology {
        RawTopology {
            version: 7,
            entities: vec![raw_entity(1, "sensor"), raw_entity(2, "capture")],
            interfaces: vec![],
            pads: vec![
                raw_pad(10, 1, 0, sys::MEDIA_PAD_FL_SOURCE),
                raw_pad(11, 2, 0, sys::MEDIA_PAD_FL_SINK),
            ],
            links: vec![raw_link(20, 10, 11, sys::MEDIA_LNK_FL_ENABLED)],
        }
    }

    #[test]
    fn test_simple_pipeline_resolution() {
        let graph = MediaGraph::resolve_with(&simple_pipeline(), &fake_devnode).unwrap();

        assert_eq!(graph.version(), 7);
        assert_eq!(graph.entities().len(), 2);
        assert_eq!(graph.pads().len(), 2);
        assert_eq!(graph.links().len(), 1);

        let link = &graph.links()[0];
        let source = graph.source_pad(link).unwrap();
        let sink = graph.sink_pad(link).unwrap();
        assert_eq!(graph.entity_of(source).unwrap().id(), 1);
        assert_eq!(graph.entity_of(sink).unwrap().id(), 2);

        // Each entity's pad links are exactly the singleton containing it.
        for entity in graph.entities() {
            let links = graph.pad_links(entity);
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].id(), 20);
        }
    }

    #[test]
    fn test_pad_ownership_is_exclusive() {
        let graph = MediaGraph::resolve_with(&simple_pipeline(), &fake_devnode).unwrap();

        for pad in graph.pads() {
            let entity = graph.entity_of(pad).unwrap();
            let owned = graph
                .pads_of(entity)
                .iter()
                .filter(|p| p.id() == pad.id())
                .count();
            assert_eq!(owned, 1, "pad {} must appear exactly once", pad.id());
        }
    }

    #[test]
    fn test_incident_links_cover_both_endpoints() {
        let graph = MediaGraph::resolve_with(&simple_pipeline(), &fake_devnode).unwrap();

        assert_eq!(graph.pad(10).unwrap().link_ids(), &[20]);
        assert_eq!(graph.pad(11).unwrap().link_ids(), &[20]);
        assert_eq!(graph.entity(1).unwrap().link_ids(), &[] as &[u32]);
    }

    #[test]
    fn test_entity_interface_resolution() {
        let mut raw = simple_pipeline();
        raw.interfaces
            .push(raw_interface(30, sys::MEDIA_INTF_T_V4L_SUBDEV, 81, 4));
        raw.links.push(raw_link(
            21,
            30,
            1,
            sys::MEDIA_LNK_FL_ENABLED | sys::MEDIA_LNK_FL_INTERFACE_LINK,
        ));

        let graph = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap();

        let sensor = graph.entity(1).unwrap();
        let iface = graph.interface_of(sensor).unwrap();
        assert_eq!(iface.id(), 30);
        assert!(iface.is_subdev());
        assert_eq!(iface.devnode(), (81, 4));
        assert_eq!(iface.dev_path(), std::path::Path::new("/dev/fake-81-4"));

        // The capture entity has no interface, which is valid.
        assert!(graph.interface_of(graph.entity(2).unwrap()).is_none());
    }

    #[test]
    fn test_multiple_interfaces_is_fatal() {
        let mut raw = simple_pipeline();
        raw.interfaces
            .push(raw_interface(30, sys::MEDIA_INTF_T_V4L_SUBDEV, 81, 4));
        raw.interfaces
            .push(raw_interface(31, sys::MEDIA_INTF_T_V4L_SUBDEV, 81, 5));
        raw.links
            .push(raw_link(21, 30, 1, sys::MEDIA_LNK_FL_INTERFACE_LINK));
        raw.links
            .push(raw_link(22, 31, 1, sys::MEDIA_LNK_FL_INTERFACE_LINK));

        let err = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)), "got {:?}", err);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_dangling_link_endpoint_is_fatal() {
        let mut raw = simple_pipeline();
        raw.links.push(raw_link(21, 10, 999, 0));

        let err = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)), "got {:?}", err);
    }

    #[test]
    fn test_dangling_pad_owner_is_fatal() {
        let mut raw = simple_pipeline();
        raw.pads.push(raw_pad(12, 999, 1, sys::MEDIA_PAD_FL_SINK));

        let err = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)), "got {:?}", err);
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let mut raw = simple_pipeline();
        raw.pads.push(raw_pad(10, 1, 1, sys::MEDIA_PAD_FL_SOURCE));

        let err = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)), "got {:?}", err);
    }

    #[test]
    fn test_interface_endpoint_as_pad_mismatch() {
        let mut raw = simple_pipeline();
        raw.interfaces
            .push(raw_interface(30, sys::MEDIA_INTF_T_V4L_VIDEO, 81, 4));
        raw.links
            .push(raw_link(21, 30, 2, sys::MEDIA_LNK_FL_INTERFACE_LINK));

        let graph = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap();
        let iface_link = graph.link(21).unwrap();

        let err = graph.source_pad(iface_link).unwrap_err();
        match err {
            Error::TypeMismatch { expected, found } => {
                assert_eq!(expected, "pad");
                assert_eq!(found, "interface");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_devnode_lookup_failure_is_fatal() {
        let mut raw = simple_pipeline();
        raw.interfaces
            .push(raw_interface(30, sys::MEDIA_INTF_T_V4L_VIDEO, 81, 4));

        let err = MediaGraph::resolve_with(&raw, &|major, minor| {
            Err(Error::NoDevnode { major, minor })
        })
        .unwrap_err();
        assert!(matches!(err, Error::NoDevnode { major: 81, minor: 4 }));
    }

    #[test]
    fn test_find_entity_glob() {
        let mut raw = simple_pipeline();
        raw.entities.push(raw_entity(3, "ov5640 4-003c"));

        let graph = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap();
        assert_eq!(graph.find_entity("ov5640*").unwrap().id(), 3);
        assert_eq!(graph.find_entity("capture").unwrap().id(), 2);
        assert!(graph.find_entity("imx219*").is_none());
    }

    #[test]
    fn test_name_decoding_stops_at_nul() {
        let mut e = raw_entity(1, "sensor");
        e.name[6] = 0;
        e.name[7] = b'x'; // junk after the terminator
        let raw = RawTopology {
            version: 0,
            entities: vec![e],
            interfaces: vec![],
            pads: vec![],
            links: vec![],
        };

        let graph = MediaGraph::resolve_with(&raw, &fake_devnode).unwrap();
        assert_eq!(graph.entities()[0].name(), "sensor");
    }

    #[test]
    fn test_entity_function_classification() {
        assert_eq!(
            EntityFunction::from_raw(sys::MEDIA_ENT_F_CAM_SENSOR),
            EntityFunction::CamSensor
        );
        assert_eq!(
            EntityFunction::from_raw(sys::MEDIA_ENT_F_IO_V4L),
            EntityFunction::IoV4l
        );
        assert_eq!(
            EntityFunction::from_raw(0xdead_beef),
            EntityFunction::Other(0xdead_beef)
        );
        assert_eq!(EntityFunction::CamSensor.name(), "camera-sensor");
    }
}
