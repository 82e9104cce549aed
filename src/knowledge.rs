//! Static description and remedy text per class.

use serde::Serialize;

use crate::labels::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiseaseInfo {
    pub description: &'static str,
    pub remedy: &'static str,
}

impl DiseaseInfo {
    /// Returned for any name outside the catalog.
    pub const FALLBACK: DiseaseInfo = DiseaseInfo {
        description: "No detailed info available for this class.",
        remedy: "Please consult an agricultural expert.",
    };

    const fn new(description: &'static str, remedy: &'static str) -> Self {
        Self {
            description,
            remedy,
        }
    }
}

/// Knowledge entry for a class name, falling back to [`DiseaseInfo::FALLBACK`].
pub fn lookup_by_name(name: &str) -> DiseaseInfo {
    match name.parse::<Label>() {
        Ok(label) => label.info(),
        Err(_) => DiseaseInfo::FALLBACK,
    }
}

impl Label {
    pub fn info(self) -> DiseaseInfo {
        match self {
            Label::AppleScab => DiseaseInfo::new(
                "Apple scab is a fungal disease caused by Venturia inaequalis. It forms dark, rough, scabby lesions on leaves, fruit and young twigs.",
                "Plant scab-resistant varieties, spray fungicides such as captan or mancozeb, and remove fallen leaves to reduce overwintering spores.",
            ),
            Label::AppleBlackRot => DiseaseInfo::new(
                "Black rot is caused by the fungus Botryosphaeria obtusa. It produces circular spots on leaves, cankers on bark and rots the fruit.",
                "Prune out infected wood, burn fallen leaves and mummified fruit, and apply thiophanate-methyl or copper-based sprays.",
            ),
            Label::AppleCedarRust => DiseaseInfo::new(
                "Cedar apple rust is caused by Gymnosporangium juniperi-virginianae. It forms orange, jelly-like spots on leaves and fruit.",
                "Remove nearby cedar or juniper hosts where possible, apply protective fungicide early in spring, and plant resistant varieties.",
            ),
            Label::AppleHealthy => DiseaseInfo::new(
                "This apple leaf is healthy and shows no sign of disease.",
                "Continue regular irrigation, pruning and nutrient management.",
            ),
            Label::BlueberryHealthy => DiseaseInfo::new(
                "The blueberry plant is healthy and shows no sign of disease.",
                "Keep the soil acidic, water regularly, and mulch to suppress weeds.",
            ),
            Label::CherryPowderyMildew => DiseaseInfo::new(
                "Powdery mildew is a fungal disease that covers cherry leaves and shoots with white, powdery patches.",
                "Thin crowded branches to improve air circulation and spray sulfur or neem oil.",
            ),
            Label::CherryHealthy => DiseaseInfo::new(
                "The cherry leaves are healthy, with no fungal or bacterial infection.",
                "Provide adequate water and fertilizer and keep the orchard clean.",
            ),
            Label::CornGrayLeafSpot => DiseaseInfo::new(
                "Gray leaf spot is caused by Cercospora fungi and forms rectangular, gray lesions on maize leaves.",
                "Rotate crops, grow resistant hybrids, and apply strobilurin fungicides when pressure is high.",
            ),
            Label::CornCommonRust => DiseaseInfo::new(
                "Common rust is caused by Puccinia sorghi and forms reddish-brown pustules on the leaves.",
                "Grow resistant varieties and apply fungicide if the disease spreads.",
            ),
            Label::CornNorthernLeafBlight => DiseaseInfo::new(
                "Northern leaf blight is caused by Exserohilum turcicum and forms long, gray-green cigar-shaped lesions on leaves.",
                "Use resistant hybrids, rotate crops, and apply fungicide at the early stage.",
            ),
            Label::CornHealthy => DiseaseInfo::new(
                "The maize leaves are green and healthy.",
                "Maintain adequate nitrogen levels and irrigation.",
            ),
            Label::GrapeBlackRot => DiseaseInfo::new(
                "Black rot is caused by Guignardia bidwellii. It forms dark spots on leaves and shrivels the berries into mummies.",
                "Cut out infected parts, improve air circulation, and spray fungicides such as myclobutanil.",
            ),
            Label::GrapeEsca => DiseaseInfo::new(
                "Esca (black measles) produces dark streaks and spots on leaves and berries and can kill the vine.",
                "Remove and burn infected vines, avoid pruning wounds, and improve drainage.",
            ),
            Label::GrapeLeafBlight => DiseaseInfo::new(
                "Leaf blight is caused by Pseudocercospora vitis and forms angular brown spots on the leaves.",
                "Remove infected leaves and apply a protective fungicide.",
            ),
            Label::GrapeHealthy => DiseaseInfo::new(
                "The grapevine is healthy, with green and vigorous leaves.",
                "Apply balanced fertilizer and prune properly to keep air moving through the canopy.",
            ),
            Label::OrangeCitrusGreening => DiseaseInfo::new(
                "Citrus greening (HLB) is caused by Candidatus Liberibacter bacteria. It causes blotchy yellow leaves and misshapen, bitter fruit.",
                "Remove infected trees, control the psyllid vector, and plant certified disease-free stock.",
            ),
            Label::PeachBacterialSpot => DiseaseInfo::new(
                "Bacterial spot is caused by Xanthomonas campestris and forms dark spots on leaves and fruit.",
                "Apply copper-based bactericides and avoid overhead irrigation.",
            ),
            Label::PeachHealthy => DiseaseInfo::new(
                "The peach leaves are healthy and free of disease.",
                "Ensure good soil drainage and grow resistant varieties.",
            ),
            Label::PepperBacterialSpot => DiseaseInfo::new(
                "Bacterial spot of bell pepper is caused by Xanthomonas species and forms dark, water-soaked spots.",
                "Use certified seed, rotate crops, and spray copper-based products preventively.",
            ),
            Label::PepperHealthy => DiseaseInfo::new(
                "The bell pepper plant is healthy, with no disease.",
                "Keep up proper watering and insect control.",
            ),
            Label::PotatoEarlyBlight => DiseaseInfo::new(
                "Early blight is caused by Alternaria solani and forms brown lesions with concentric rings on the leaves.",
                "Plant disease-free seed tubers, rotate crops, and apply fungicides such as chlorothalonil.",
            ),
            Label::PotatoLateBlight => DiseaseInfo::new(
                "Late blight is caused by Phytophthora infestans and forms dark lesions on leaves, stems and tubers.",
                "Avoid prolonged leaf wetness, grow resistant varieties, and spray fungicides such as metalaxyl.",
            ),
            Label::PotatoHealthy => DiseaseInfo::new(
                "The potato plant is healthy, with no disease or blight.",
                "Keep up proper hilling and water management.",
            ),
            Label::RaspberryHealthy => DiseaseInfo::new(
                "The raspberry plant is healthy, with no disease.",
                "Prune properly and keep good air circulation.",
            ),
            Label::SoybeanHealthy => DiseaseInfo::new(
                "The soybean plant is healthy and shows no sign of disease.",
                "Rotate crops and keep weeds under control.",
            ),
            Label::SquashPowderyMildew => DiseaseInfo::new(
                "Powdery mildew forms white, powdery patches on squash leaves and stems.",
                "Remove infected leaves, improve air circulation, and apply sulfur-based fungicide.",
            ),
            Label::StrawberryLeafScorch => DiseaseInfo::new(
                "Leaf scorch forms reddish-brown blotches on strawberry leaves, which eventually dry out and die.",
                "Remove infected leaves, avoid overhead watering, and plant resistant varieties.",
            ),
            Label::StrawberryHealthy => DiseaseInfo::new(
                "The strawberry plant is healthy, with green and vigorous leaves.",
                "Provide enough sunlight and keep adequate spacing between plants.",
            ),
            Label::TomatoBacterialSpot => DiseaseInfo::new(
                "Bacterial spot is caused by Xanthomonas species and forms small dark spots on leaves and fruit.",
                "Use disease-free seed, spray copper, and rotate crops.",
            ),
            Label::TomatoEarlyBlight => DiseaseInfo::new(
                "Early blight is caused by Alternaria solani and forms ringed brown spots on older leaves.",
                "Remove infected leaves, improve air circulation, and apply chlorothalonil fungicide.",
            ),
            Label::TomatoLateBlight => DiseaseInfo::new(
                "Late blight is caused by Phytophthora infestans and forms large, water-soaked lesions on leaves and fruit.",
                "Avoid overhead watering, destroy infected plants, and use a systemic fungicide.",
            ),
            Label::TomatoLeafMold => DiseaseInfo::new(
                "Leaf mold is caused by Passalora fulva and forms yellow patches on the upper leaf surface with olive mold beneath.",
                "Improve ventilation, lower humidity, and spray copper-based fungicide.",
            ),
            Label::TomatoSeptoriaLeafSpot => DiseaseInfo::new(
                "Septoria leaf spot forms small circular spots with gray centers on the leaves.",
                "Remove infected leaves, keep foliage dry, and apply fungicides such as mancozeb.",
            ),
            Label::TomatoSpiderMites => DiseaseInfo::new(
                "Two-spotted spider mites cause yellow-brown stippling and fine webbing on leaves, which may drop.",
                "Spray neem oil or insecticidal soap and keep humidity up around the plants.",
            ),
            Label::TomatoTargetSpot => DiseaseInfo::new(
                "Target spot is caused by Corynespora cassiicola and forms ringed, target-like lesions.",
                "Remove infected leaves, rotate crops, and spray fungicide preventively.",
            ),
            Label::TomatoYellowLeafCurlVirus => DiseaseInfo::new(
                "This viral disease curls leaves upward, yellows their margins and stunts the plant.",
                "Control whiteflies, remove infected plants, and grow resistant varieties.",
            ),
            Label::TomatoMosaicVirus => DiseaseInfo::new(
                "Tomato mosaic virus causes mottled, mosaic-like patterns and distortion on the leaves.",
                "Do not handle plants after using tobacco, disinfect tools, and grow resistant varieties.",
            ),
            Label::TomatoHealthy => DiseaseInfo::new(
                "The tomato plant is healthy, with no disease.",
                "Keep watering and nutrition balanced.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_has_text() {
        for label in Label::ALL {
            let info = label.info();
            assert!(!info.description.trim().is_empty(), "{label}");
            assert!(!info.remedy.trim().is_empty(), "{label}");
            assert_ne!(info, DiseaseInfo::FALLBACK, "{label}");
        }
    }

    #[test]
    fn lookup_by_catalog_name() {
        for label in Label::ALL {
            assert_eq!(lookup_by_name(label.as_str()), label.info());
        }
    }

    #[test]
    fn unknown_names_get_fallback_verbatim() {
        for name in ["", "Banana___Panama_disease", "tomato___healthy", "Tomato"] {
            let info = lookup_by_name(name);
            assert_eq!(info.description, "No detailed info available for this class.");
            assert_eq!(info.remedy, "Please consult an agricultural expert.");
        }
    }
}
