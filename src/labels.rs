//! PlantVillage class catalog.
//!
//! Variant order is the network's output order: the class directories sorted
//! alphabetically, as ImageFolder enumerated them when the weights were
//! trained. Do not reorder.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

pub const LABEL_COUNT: usize = 38;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    AppleScab,
    AppleBlackRot,
    AppleCedarRust,
    AppleHealthy,
    BlueberryHealthy,
    CherryPowderyMildew,
    CherryHealthy,
    CornGrayLeafSpot,
    CornCommonRust,
    CornNorthernLeafBlight,
    CornHealthy,
    GrapeBlackRot,
    GrapeEsca,
    GrapeLeafBlight,
    GrapeHealthy,
    OrangeCitrusGreening,
    PeachBacterialSpot,
    PeachHealthy,
    PepperBacterialSpot,
    PepperHealthy,
    PotatoEarlyBlight,
    PotatoLateBlight,
    PotatoHealthy,
    RaspberryHealthy,
    SoybeanHealthy,
    SquashPowderyMildew,
    StrawberryLeafScorch,
    StrawberryHealthy,
    TomatoBacterialSpot,
    TomatoEarlyBlight,
    TomatoLateBlight,
    TomatoLeafMold,
    TomatoSeptoriaLeafSpot,
    TomatoSpiderMites,
    TomatoTargetSpot,
    TomatoYellowLeafCurlVirus,
    TomatoMosaicVirus,
    TomatoHealthy,
}

impl Label {
    pub const ALL: [Label; LABEL_COUNT] = [
        Label::AppleScab,
        Label::AppleBlackRot,
        Label::AppleCedarRust,
        Label::AppleHealthy,
        Label::BlueberryHealthy,
        Label::CherryPowderyMildew,
        Label::CherryHealthy,
        Label::CornGrayLeafSpot,
        Label::CornCommonRust,
        Label::CornNorthernLeafBlight,
        Label::CornHealthy,
        Label::GrapeBlackRot,
        Label::GrapeEsca,
        Label::GrapeLeafBlight,
        Label::GrapeHealthy,
        Label::OrangeCitrusGreening,
        Label::PeachBacterialSpot,
        Label::PeachHealthy,
        Label::PepperBacterialSpot,
        Label::PepperHealthy,
        Label::PotatoEarlyBlight,
        Label::PotatoLateBlight,
        Label::PotatoHealthy,
        Label::RaspberryHealthy,
        Label::SoybeanHealthy,
        Label::SquashPowderyMildew,
        Label::StrawberryLeafScorch,
        Label::StrawberryHealthy,
        Label::TomatoBacterialSpot,
        Label::TomatoEarlyBlight,
        Label::TomatoLateBlight,
        Label::TomatoLeafMold,
        Label::TomatoSeptoriaLeafSpot,
        Label::TomatoSpiderMites,
        Label::TomatoTargetSpot,
        Label::TomatoYellowLeafCurlVirus,
        Label::TomatoMosaicVirus,
        Label::TomatoHealthy,
    ];

    /// Label at a position of the network output, if the position exists.
    pub fn from_index(index: usize) -> Option<Label> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Class directory name used at training time.
    pub fn as_str(self) -> &'static str {
        match self {
            Label::AppleScab => "Apple___Apple_scab",
            Label::AppleBlackRot => "Apple___Black_rot",
            Label::AppleCedarRust => "Apple___Cedar_apple_rust",
            Label::AppleHealthy => "Apple___healthy",
            Label::BlueberryHealthy => "Blueberry___healthy",
            Label::CherryPowderyMildew => "Cherry_(including_sour)___Powdery_mildew",
            Label::CherryHealthy => "Cherry_(including_sour)___healthy",
            Label::CornGrayLeafSpot => "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
            Label::CornCommonRust => "Corn_(maize)___Common_rust_",
            Label::CornNorthernLeafBlight => "Corn_(maize)___Northern_Leaf_Blight",
            Label::CornHealthy => "Corn_(maize)___healthy",
            Label::GrapeBlackRot => "Grape___Black_rot",
            Label::GrapeEsca => "Grape___Esca_(Black_Measles)",
            Label::GrapeLeafBlight => "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
            Label::GrapeHealthy => "Grape___healthy",
            Label::OrangeCitrusGreening => "Orange___Haunglongbing_(Citrus_greening)",
            Label::PeachBacterialSpot => "Peach___Bacterial_spot",
            Label::PeachHealthy => "Peach___healthy",
            Label::PepperBacterialSpot => "Pepper,_bell___Bacterial_spot",
            Label::PepperHealthy => "Pepper,_bell___healthy",
            Label::PotatoEarlyBlight => "Potato___Early_blight",
            Label::PotatoLateBlight => "Potato___Late_blight",
            Label::PotatoHealthy => "Potato___healthy",
            Label::RaspberryHealthy => "Raspberry___healthy",
            Label::SoybeanHealthy => "Soybean___healthy",
            Label::SquashPowderyMildew => "Squash___Powdery_mildew",
            Label::StrawberryLeafScorch => "Strawberry___Leaf_scorch",
            Label::StrawberryHealthy => "Strawberry___healthy",
            Label::TomatoBacterialSpot => "Tomato___Bacterial_spot",
            Label::TomatoEarlyBlight => "Tomato___Early_blight",
            Label::TomatoLateBlight => "Tomato___Late_blight",
            Label::TomatoLeafMold => "Tomato___Leaf_Mold",
            Label::TomatoSeptoriaLeafSpot => "Tomato___Septoria_leaf_spot",
            Label::TomatoSpiderMites => "Tomato___Spider_mites Two-spotted_spider_mite",
            Label::TomatoTargetSpot => "Tomato___Target_Spot",
            Label::TomatoYellowLeafCurlVirus => "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
            Label::TomatoMosaicVirus => "Tomato___Tomato_mosaic_virus",
            Label::TomatoHealthy => "Tomato___healthy",
        }
    }

    /// Crop half of the class name, e.g. `Pepper,_bell`.
    pub fn crop(self) -> &'static str {
        self.split().0
    }

    /// Condition half of the class name, e.g. `Bacterial_spot` or `healthy`.
    pub fn condition(self) -> &'static str {
        self.split().1
    }

    pub fn is_healthy(self) -> bool {
        self.condition() == "healthy"
    }

    fn split(self) -> (&'static str, &'static str) {
        let name = self.as_str();
        name.split_once("___").unwrap_or((name, ""))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a catalog label")]
pub struct UnknownLabel(pub String);

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
