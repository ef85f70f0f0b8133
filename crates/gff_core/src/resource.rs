use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field_type::VectorLayout;
use crate::header::FileType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Gff,
    Are,
    Bic,
    Dlg,
    Fac,
    Gam,
    Git,
    Gui,
    Ifo,
    Jrl,
    Nfo,
    Pth,
    Utc,
    Utd,
    Ute,
    Uti,
    Utm,
    Utp,
    Uts,
    Utt,
    Utw,
}

static REGISTRY: [(ResourceKind, &[u8; 4], &str); 21] = [
    (ResourceKind::Gff, b"GFF ", "generic GFF container"),
    (ResourceKind::Are, b"ARE ", "area static properties"),
    (ResourceKind::Bic, b"BIC ", "player character"),
    (ResourceKind::Dlg, b"DLG ", "dialogue tree"),
    (ResourceKind::Fac, b"FAC ", "faction table"),
    (ResourceKind::Gam, b"GAM ", "saved game globals"),
    (ResourceKind::Git, b"GIT ", "area instance list"),
    (ResourceKind::Gui, b"GUI ", "interface layout"),
    (ResourceKind::Ifo, b"IFO ", "module info"),
    (ResourceKind::Jrl, b"JRL ", "journal"),
    (ResourceKind::Nfo, b"NFO ", "save game info"),
    (ResourceKind::Pth, b"PTH ", "area path points"),
    (ResourceKind::Utc, b"UTC ", "creature template"),
    (ResourceKind::Utd, b"UTD ", "door template"),
    (ResourceKind::Ute, b"UTE ", "encounter template"),
    (ResourceKind::Uti, b"UTI ", "item template"),
    (ResourceKind::Utm, b"UTM ", "merchant template"),
    (ResourceKind::Utp, b"UTP ", "placeable template"),
    (ResourceKind::Uts, b"UTS ", "sound template"),
    (ResourceKind::Utt, b"UTT ", "trigger template"),
    (ResourceKind::Utw, b"UTW ", "waypoint template"),
];

impl ResourceKind {
    pub fn all() -> impl Iterator<Item = ResourceKind> {
        REGISTRY.iter().map(|(kind, _, _)| *kind)
    }

    /// Registry rows are listed in declaration order.
    fn entry(&self) -> &'static (ResourceKind, &'static [u8; 4], &'static str) {
        &REGISTRY[*self as usize]
    }

    pub fn tag(&self) -> FileType {
        FileType::new(*self.entry().1)
    }

    pub fn description(&self) -> &'static str {
        self.entry().2
    }

    pub fn from_tag(tag: FileType) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|(_, t, _)| *t == tag.as_bytes())
            .map(|(kind, _, _)| *kind)
    }

    /// Codes used for vector3/vector4 fields in this resource.
    ///
    /// The journal format document assigns 16 to vector3; every other
    /// resource uses 16 for the orientation quaternion.
    pub fn vector_layout(&self) -> VectorLayout {
        match self {
            Self::Jrl => VectorLayout::VectorFirst,
            _ => VectorLayout::OrientationFirst,
        }
    }

    /// Identify a buffer by its leading tag without decoding it.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let tag: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Self::from_tag(FileType::new(tag))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().as_str().trim_end())
    }
}
