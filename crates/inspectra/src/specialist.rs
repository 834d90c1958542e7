//! Keyword-scoring specialists.
//!
//! One configurable scorer driven by declarative category tables: every
//! specialist is a tagged set of [`CategorySpec`]s, and scoring is a pure
//! function over lower-cased document text.

use serde::{Deserialize, Serialize};

use crate::types::SpecialistType;

/// Result of matching one keyword set against a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    pub count: usize,
    pub matched: Vec<String>,
}

/// Count keyword substring hits in already lower-cased text.
pub fn score(text_lower: &str, keywords: &[&str]) -> KeywordScore {
    let matched: Vec<String> = keywords
        .iter()
        .filter(|k| text_lower.contains(&k.to_lowercase()))
        .map(|k| k.to_string())
        .collect();
    KeywordScore {
        count: matched.len(),
        matched,
    }
}

/// A secondary cue: fires when every `all` term and at least one `any` term
/// is present (an empty `any` list means `all` alone decides).
pub struct Cue {
    pub all: &'static [&'static str],
    pub any: &'static [&'static str],
    pub note: &'static str,
}

/// One analysis category: indicator keywords bump confidence when any hit,
/// variant keywords add a larger bump and are listed by name in the finding.
pub struct CategorySpec {
    pub category: &'static str,
    pub base_confidence: f32,
    pub indicator_label: &'static str,
    pub indicators: &'static [&'static str],
    pub variant_label: &'static str,
    pub variants: &'static [&'static str],
    pub cues: &'static [Cue],
}

const INDICATOR_BUMP: f32 = 0.10;
const VARIANT_BUMP: f32 = 0.15;
const CUE_BUMP: f32 = 0.10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub findings: Vec<String>,
    pub confidence: f32,
    pub matched_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub specialist_type: SpecialistType,
    pub results: Vec<CategoryScore>,
    pub confidence: f32,
    pub recommendations: Vec<String>,
}

impl CategorySpec {
    fn evaluate(&self, text_lower: &str) -> CategoryScore {
        let mut findings = Vec::new();
        let mut confidence = self.base_confidence;
        let mut matched_terms = Vec::new();

        let indicator_score = score(text_lower, self.indicators);
        if indicator_score.count > 0 {
            findings.push(format!(
                "Identified {} {} terms",
                indicator_score.count, self.indicator_label
            ));
            confidence += INDICATOR_BUMP;
            matched_terms.extend(indicator_score.matched);
        }

        let variant_score = score(text_lower, self.variants);
        if variant_score.count > 0 {
            findings.push(format!(
                "{}: {}",
                self.variant_label,
                variant_score.matched.join(", ")
            ));
            confidence += VARIANT_BUMP;
            matched_terms.extend(variant_score.matched);
        }

        for cue in self.cues {
            let all_hit = cue.all.iter().all(|t| text_lower.contains(t));
            let any_hit = cue.any.is_empty() || cue.any.iter().any(|t| text_lower.contains(t));
            if all_hit && any_hit {
                findings.push(cue.note.to_string());
                confidence += CUE_BUMP;
            }
        }

        CategoryScore {
            category: self.category.to_string(),
            findings,
            confidence: confidence.min(1.0),
            matched_terms,
        }
    }
}

/// Run every category for a specialist against the document text.
pub fn analyze_document(specialist: SpecialistType, text: &str) -> DocumentAnalysis {
    let text_lower = text.to_lowercase();
    let results: Vec<CategoryScore> = categories(specialist)
        .iter()
        .map(|spec| spec.evaluate(&text_lower))
        .collect();

    let confidence = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.confidence).sum::<f32>() / results.len() as f32
    };

    let recommendations = derive_recommendations(&results);

    DocumentAnalysis {
        specialist_type: specialist,
        results,
        confidence,
        recommendations,
    }
}

/// Confidence-threshold recommendations shared by all specialists.
fn derive_recommendations(results: &[CategoryScore]) -> Vec<String> {
    let mut recommendations = Vec::new();
    for result in results {
        if result.confidence < 0.7 {
            recommendations.push(format!(
                "Review {} analysis - low confidence score",
                result.category
            ));
        }
        let cat_lower = result.category.to_lowercase();
        if cat_lower.contains("critical") || cat_lower.contains("urgent") {
            recommendations.push(format!(
                "Immediate attention required for {}",
                result.category
            ));
        }
        if result.confidence > 0.9 {
            recommendations.push(format!(
                "High confidence in {} findings",
                result.category
            ));
        }
    }
    recommendations
}

fn categories(specialist: SpecialistType) -> &'static [CategorySpec] {
    match specialist {
        SpecialistType::CorrosionEngineer => CORROSION_CATEGORIES,
        SpecialistType::SubseaEngineer => SUBSEA_CATEGORIES,
        SpecialistType::MethodsSpecialist => METHODS_CATEGORIES,
        SpecialistType::DisciplineHead => DISCIPLINE_CATEGORIES,
    }
}

static CORROSION_CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        category: "Corrosion Mechanisms",
        base_confidence: 0.8,
        indicator_label: "corrosion-related",
        indicators: &["corrosion", "rust", "oxidation", "pitting", "crevice", "galvanic"],
        variant_label: "Corrosion types identified",
        variants: &["pitting", "crevice", "galvanic", "stress", "intergranular", "uniform"],
        cues: &[
            Cue {
                all: &[],
                any: &["electrochemical", "anode", "cathode"],
                note: "Electrochemical processes identified",
            },
            Cue {
                all: &["rate"],
                any: &["corrosion", "mpy"],
                note: "Corrosion rate considerations present",
            },
        ],
    },
    CategorySpec {
        category: "Material Analysis",
        base_confidence: 0.75,
        indicator_label: "material-related",
        indicators: &["steel", "stainless", "aluminum", "copper", "titanium", "alloy"],
        variant_label: "Materials identified",
        variants: &[
            "carbon steel",
            "stainless steel",
            "duplex",
            "super duplex",
            "inconel",
            "hastelloy",
        ],
        cues: &[
            Cue {
                all: &[],
                any: &["hardness", "tensile", "yield"],
                note: "Material properties discussed",
            },
            Cue {
                all: &["resistance"],
                any: &["corrosion", "chemical"],
                note: "Corrosion resistance considerations present",
            },
        ],
    },
    CategorySpec {
        category: "Environmental Factors",
        base_confidence: 0.8,
        indicator_label: "environmental",
        indicators: &["temperature", "pressure", "ph", "oxygen", "chloride", "sulfide", "co2"],
        variant_label: "Environmental conditions",
        variants: &["sour", "sweet", "acidic", "alkaline", "saline", "marine"],
        cues: &[
            Cue {
                all: &["temperature"],
                any: &["high", "low"],
                note: "Temperature effects identified",
            },
            Cue {
                all: &[],
                any: &["composition", "concentration"],
                note: "Chemical composition considerations present",
            },
        ],
    },
    CategorySpec {
        category: "Prevention Strategies",
        base_confidence: 0.8,
        indicator_label: "prevention strategy",
        indicators: &["coating", "paint", "cathodic", "inhibitor", "protection", "prevention"],
        variant_label: "Prevention methods",
        variants: &["cathodic protection", "coating", "inhibitor", "anodic protection", "design"],
        cues: &[
            Cue {
                all: &[],
                any: &["coating", "paint"],
                note: "Coating systems identified",
            },
            Cue {
                all: &["cathodic", "protection"],
                any: &[],
                note: "Cathodic protection system identified",
            },
        ],
    },
    CategorySpec {
        category: "Inspection Methods",
        base_confidence: 0.75,
        indicator_label: "inspection-related",
        indicators: &["inspection", "monitoring", "ndt", "ultrasonic", "radiographic", "magnetic"],
        variant_label: "NDT methods",
        variants: &[
            "ultrasonic",
            "radiographic",
            "magnetic particle",
            "dye penetrant",
            "eddy current",
        ],
        cues: &[
            Cue {
                all: &["monitoring"],
                any: &["system", "equipment"],
                note: "Monitoring systems identified",
            },
            Cue {
                all: &["frequency"],
                any: &["inspection", "monitoring"],
                note: "Inspection frequency considerations present",
            },
        ],
    },
];

static SUBSEA_CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        category: "Subsea Systems",
        base_confidence: 0.8,
        indicator_label: "subsea",
        indicators: &["subsea", "underwater", "marine", "offshore", "submerged", "deepwater"],
        variant_label: "Subsea components",
        variants: &["wellhead", "christmas tree", "manifold", "umbilical", "riser", "flowline"],
        cues: &[Cue {
            all: &["water depth"],
            any: &[],
            note: "Water depth considerations present",
        }],
    },
    CategorySpec {
        category: "Riser Systems",
        base_confidence: 0.75,
        indicator_label: "riser-related",
        indicators: &["riser", "flowline", "pipeline", "jumper", "spool", "connection"],
        variant_label: "Riser types",
        variants: &["flexible", "rigid", "steel catenary", "top tensioned", "hybrid"],
        cues: &[Cue {
            all: &["fatigue"],
            any: &["riser", "pipeline"],
            note: "Fatigue considerations present",
        }],
    },
    CategorySpec {
        category: "Marine Environment",
        base_confidence: 0.8,
        indicator_label: "marine environment",
        indicators: &["wave", "current", "tide", "storm", "hurricane", "typhoon", "seabed"],
        variant_label: "Environmental conditions",
        variants: &["shallow water", "deepwater", "ultra-deepwater", "arctic", "tropical"],
        cues: &[Cue {
            all: &[],
            any: &["metocean", "hydrodynamic"],
            note: "Metocean data considerations present",
        }],
    },
    CategorySpec {
        category: "Operations",
        base_confidence: 0.75,
        indicator_label: "operations",
        indicators: &[
            "installation",
            "operation",
            "maintenance",
            "intervention",
            "repair",
            "decommissioning",
        ],
        variant_label: "Installation methods",
        variants: &["diving", "rov", "remotely operated", "diverless", "surface"],
        cues: &[Cue {
            all: &["vessel"],
            any: &["installation", "intervention"],
            note: "Vessel operations identified",
        }],
    },
    CategorySpec {
        category: "Safety & Reliability",
        base_confidence: 0.8,
        indicator_label: "safety and reliability",
        indicators: &["safety", "reliability", "risk", "failure", "integrity", "monitoring"],
        variant_label: "Integrity measures",
        variants: &["barrier", "redundancy", "leak detection", "emergency shutdown"],
        cues: &[Cue {
            all: &["integrity"],
            any: &["management", "assessment"],
            note: "Integrity management considerations present",
        }],
    },
];

static METHODS_CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        category: "Method Analysis",
        base_confidence: 0.75,
        indicator_label: "method-related",
        indicators: &["method", "technique", "approach", "procedure", "process", "workflow"],
        variant_label: "Engineering methods identified",
        variants: &["finite element", "computational", "simulation", "modeling", "analysis"],
        cues: &[Cue {
            all: &[],
            any: &["validation", "verification"],
            note: "Method validation considerations present",
        }],
    },
    CategorySpec {
        category: "Procedure Analysis",
        base_confidence: 0.75,
        indicator_label: "procedure-related",
        indicators: &["procedure", "process", "workflow", "step", "sequence", "protocol"],
        variant_label: "Procedure elements",
        variants: &["checklist", "work instruction", "hold point", "sign-off"],
        cues: &[Cue {
            all: &[],
            any: &["approval", "review"],
            note: "Approval workflow identified",
        }],
    },
    CategorySpec {
        category: "Best Practices",
        base_confidence: 0.8,
        indicator_label: "best-practice",
        indicators: &["best practice", "standard", "guideline", "recommendation", "optimal"],
        variant_label: "Industry standards referenced",
        variants: &["iso", "api", "asme", "astm", "nace"],
        cues: &[Cue {
            all: &[],
            any: &["lessons learned", "benchmark"],
            note: "Continuous improvement considerations present",
        }],
    },
    CategorySpec {
        category: "Workflow Analysis",
        base_confidence: 0.75,
        indicator_label: "workflow",
        indicators: &["workflow", "process", "sequence", "order", "timeline", "schedule"],
        variant_label: "Optimization opportunities",
        variants: &["bottleneck", "efficiency", "automation", "streamline"],
        cues: &[Cue {
            all: &["schedule"],
            any: &["delay", "critical path"],
            note: "Schedule risk considerations present",
        }],
    },
];

static DISCIPLINE_CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        category: "Project Overview",
        base_confidence: 0.8,
        indicator_label: "project-related",
        indicators: &["project", "scope", "objective", "deliverable", "milestone", "budget"],
        variant_label: "Project phases",
        variants: &["feasibility", "concept", "feed", "detailed design", "execution"],
        cues: &[Cue {
            all: &[],
            any: &["stakeholder", "interface"],
            note: "Stakeholder considerations present",
        }],
    },
    CategorySpec {
        category: "Risk Assessment",
        base_confidence: 0.8,
        indicator_label: "risk-related",
        indicators: &["risk", "hazard", "safety", "failure", "critical", "urgent"],
        variant_label: "Risk controls",
        variants: &["mitigation", "contingency", "barrier", "hazop"],
        cues: &[Cue {
            all: &["risk"],
            any: &["register", "matrix"],
            note: "Formal risk management identified",
        }],
    },
    CategorySpec {
        category: "Compliance Review",
        base_confidence: 0.75,
        indicator_label: "compliance",
        indicators: &["standard", "regulation", "code", "compliance", "requirement", "specification"],
        variant_label: "References to standards",
        variants: &["iso", "api", "asme", "dnv", "norsok"],
        cues: &[Cue {
            all: &[],
            any: &["audit", "certification"],
            note: "Audit considerations present",
        }],
    },
    CategorySpec {
        category: "Decision Points",
        base_confidence: 0.75,
        indicator_label: "decision-related",
        indicators: &["decision", "recommendation", "conclusion", "action", "next step"],
        variant_label: "Priority signals",
        variants: &["high priority", "urgent", "critical", "important"],
        cues: &[Cue {
            all: &[],
            any: &["approve", "endorse", "authorize"],
            note: "Approval decisions identified",
        }],
    },
];

/// Static reference list included in the report appendix.
pub fn references(specialist: SpecialistType) -> Vec<String> {
    let refs: &[&str] = match specialist {
        SpecialistType::CorrosionEngineer => &[
            "API 510: Pressure Vessel Inspection Code",
            "NACE SP0191: Application of Internal Linings",
            "ISO 12944: Corrosion Protection Standards",
            "ASME Section VIII: Pressure Vessel Code",
        ],
        SpecialistType::SubseaEngineer => &[
            "API 17D: Subsea Wellhead and Tree Equipment",
            "ISO 13628: Petroleum and natural gas industries",
            "DNV-RP-F109: Subsea Pipeline Systems",
            "API 6A: Wellhead and Christmas Tree Equipment",
        ],
        SpecialistType::MethodsSpecialist => &[
            "ISO 9001: Quality Management Systems",
            "API 570: Piping Inspection Code",
            "ASME B31.3: Process Piping",
            "Company Standard Operating Procedures",
        ],
        SpecialistType::DisciplineHead => &[
            "PMI PMBOK: Project Management Body of Knowledge",
            "ISO 31000: Risk Management",
            "Company Project Management Standards",
            "Industry Best Practices Guidelines",
        ],
    };
    refs.iter().map(|s| s.to_string()).collect()
}

/// System prompt fed to the external LLM for chat turns.
pub fn system_prompt(specialist: SpecialistType, is_report_request: bool) -> String {
    let base = match specialist {
        SpecialistType::CorrosionEngineer => {
            "You are an expert Corrosion Engineer specializing in material degradation analysis, \
             corrosion prevention, and protective coating systems. Provide technical, accurate, \
             and actionable advice."
        }
        SpecialistType::SubseaEngineer => {
            "You are an expert Subsea Engineer specializing in underwater operations, marine \
             systems, and subsea infrastructure. Provide technical guidance on subsea equipment \
             and operations."
        }
        SpecialistType::MethodsSpecialist => {
            "You are a Methods Specialist expert in operational procedures, engineering methods, \
             and process optimization. Provide guidance on best practices and methodology."
        }
        SpecialistType::DisciplineHead => {
            "You are a Discipline Head responsible for project oversight, coordination, and \
             strategic decision-making. Provide high-level guidance and recommendations."
        }
    };

    if is_report_request {
        format!(
            "{}\n\nThe user has requested a report. Acknowledge this request and explain what \
             will be included in the report based on your analysis of the conversation.",
            base
        )
    } else {
        base.to_string()
    }
}

/// Canned reply used when the external LLM is unavailable.
pub fn fallback_response(specialist: SpecialistType, is_report_request: bool) -> String {
    let title = specialist.display_name();
    if is_report_request {
        format!(
            "As a {}, I've analyzed our conversation and I'm now generating a comprehensive \
             report for you. The report will include my findings, technical analysis, risk \
             assessment, and recommendations based on our discussion.",
            title
        )
    } else {
        format!(
            "As a {}, I'm here to help with your inquiry. Could you provide more details so I \
             can give you the most accurate and helpful information?",
            title
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_counts_and_lists_matches() {
        let result = score(
            "pitting corrosion was observed near the weld",
            &["corrosion", "rust", "pitting", "galvanic"],
        );
        assert_eq!(result.count, 2);
        assert_eq!(result.matched, vec!["corrosion", "pitting"]);
    }

    #[test]
    fn score_is_case_insensitive_on_keywords() {
        let result = score("stainless steel flange", &["Stainless Steel"]);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn corrosion_analysis_finds_mechanisms() {
        let text = "Severe pitting corrosion identified on the carbon steel shell. \
                    Corrosion rate estimated at 12 mpy. Recommend cathodic protection.";
        let analysis = analyze_document(SpecialistType::CorrosionEngineer, text);
        assert_eq!(analysis.results.len(), 5);

        let mechanisms = &analysis.results[0];
        assert_eq!(mechanisms.category, "Corrosion Mechanisms");
        assert!(mechanisms
            .findings
            .iter()
            .any(|f| f.contains("corrosion-related")));
        assert!(mechanisms
            .findings
            .iter()
            .any(|f| f == "Corrosion rate considerations present"));
        assert!(mechanisms.confidence > 0.8 && mechanisms.confidence <= 1.0);
    }

    #[test]
    fn confidence_never_exceeds_one() {
        let text = "corrosion rust oxidation pitting crevice galvanic stress intergranular \
                    uniform electrochemical anode cathode rate mpy";
        let analysis = analyze_document(SpecialistType::CorrosionEngineer, text);
        for result in &analysis.results {
            assert!(result.confidence <= 1.0);
        }
    }

    #[test]
    fn bland_text_yields_no_recommendations() {
        // No indicators or cues fire, so every category sits at its base
        // confidence, above the review threshold and below the high mark.
        let analysis = analyze_document(SpecialistType::MethodsSpecialist, "hello there");
        assert!(analysis.recommendations.is_empty());
        for result in &analysis.results {
            assert!(result.confidence >= 0.7 && result.confidence <= 0.9);
        }
    }

    #[test]
    fn saturated_text_triggers_high_confidence_recommendation() {
        let text = "corrosion rust oxidation pitting crevice galvanic stress intergranular \
                    uniform electrochemical anode cathode rate mpy";
        let analysis = analyze_document(SpecialistType::CorrosionEngineer, text);
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.contains("High confidence in Corrosion Mechanisms")));
    }

    #[test]
    fn references_cover_every_specialist() {
        for s in [
            SpecialistType::CorrosionEngineer,
            SpecialistType::SubseaEngineer,
            SpecialistType::MethodsSpecialist,
            SpecialistType::DisciplineHead,
        ] {
            assert_eq!(references(s).len(), 4);
        }
    }
}
