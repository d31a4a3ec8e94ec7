//! The report prompt.
//!
//! The prompt is built from a declarative table of sections. Every
//! template may contain `{area}`, which is replaced with the area name
//! when the prompt is rendered.

use std::fmt::Write as _;

use chrono::NaiveDate;

/// Placeholder substituted with the area name.
const AREA: &str = "{area}";

/// Title every report must start with.
pub const REPORT_TITLE_TEMPLATE: &str =
    "Comprehensive Report on Healthcare in {area}: Diseases, Emerging Risks, and Government Schemes";

/// One instruction inside a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// A bullet point directly under the section heading.
    Point(&'static str),
    /// A `###` subsection with the instruction for its content.
    Subsection {
        /// Heading including its number, e.g. `### 2.1. Communicable Diseases`.
        heading: &'static str,
        /// What the subsection must cover.
        text: &'static str,
    },
}

/// A main (`##`) section of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDef {
    /// Stable section key.
    pub key: &'static str,
    /// Heading text template.
    pub title: &'static str,
    /// Content instructions in order.
    pub instructions: &'static [Instruction],
}

/// The report sections in order.
pub const SECTIONS: &[SectionDef] = &[
    SectionDef {
        key: "introduction",
        title: "1. Introduction",
        instructions: &[
            Instruction::Point(
                "Provide a comprehensive and detailed overview of **'{area}'**, its demographic \
                 profile (population size, age structure - *consider a pie/bar chart for age \
                 distribution if data is available*, density, urbanization rate), and its broad \
                 socio-economic context.",
            ),
            Instruction::Point("Give a general introduction to **'{area}'s** healthcare system landscape."),
            Instruction::Point("State the main objectives and scope of this report."),
        ],
    },
    SectionDef {
        key: "major_diseases",
        title: "2. Major Diseases in {area}",
        instructions: &[
            Instruction::Subsection {
                heading: "### 2.1. Communicable Diseases",
                text: "Detailed analysis of prevalent communicable diseases in **'{area}'**. For \
                       each major disease: incidence/prevalence rates (with trends - *consider \
                       line charts for trends of 2-3 key diseases*), mortality, affected \
                       populations, control programs, challenges.",
            },
            Instruction::Subsection {
                heading: "### 2.2. Non-Communicable Diseases (NCDs)",
                text: "In-depth discussion of major NCDs in **'{area}'**. For each NCD group: \
                       prevalence rates and trends (*line/bar chart for trends or comparison of \
                       prevalence of top 2-3 NCDs*), risk factors, impact, management strategies, \
                       screening programs.",
            },
        ],
    },
    SectionDef {
        key: "emerging_risks",
        title: "3. Emerging Health Risks & Trends in {area}",
        instructions: &[
            Instruction::Subsection {
                heading: "### 3.1. Zoonotic Diseases",
                text: "Discuss notable emerging zoonotic diseases, potential, surveillance, \
                       preparedness.",
            },
            Instruction::Subsection {
                heading: "### 3.2. Antimicrobial Resistance (AMR)",
                text: "Analyze AMR situation, pathogen resistance patterns - *consider a table or \
                       bar chart for resistance levels of key pathogens to common antibiotics*, \
                       drivers, action plans.",
            },
            Instruction::Subsection {
                heading: "### 3.3. Environmental Health Risks",
                text: "Detail impacts of air/water pollution, climate change on health - *if \
                       specific data on pollution levels vs health outcomes is found, consider a \
                       chart*.",
            },
            Instruction::Subsection {
                heading: "### 3.4. Mental Health",
                text: "Overview of mental health landscape, prevalence of common disorders - *bar \
                       chart comparing prevalence of 2-3 common disorders if data available*, \
                       services, stigma, initiatives.",
            },
            Instruction::Subsection {
                heading: "### 3.5. Population Health Trends & Analysis",
                text: "Analyze demographic shifts - *ageing trend line chart*, nutritional status \
                       - *pie/bar chart for malnutrition categories*, lifestyle changes and their \
                       health implications. Discuss health equity.",
            },
        ],
    },
    SectionDef {
        key: "govt_schemes",
        title: "4. Government Healthcare Schemes & Initiatives in {area}",
        instructions: &[
            Instruction::Subsection {
                heading: "### 4.1. [Major National Scheme 1 for {area}]",
                text: "Extremely detailed analysis: objectives, coverage - *bar chart for \
                       beneficiary numbers over years if available*, services, impact, \
                       challenges.",
            },
            Instruction::Subsection {
                heading: "### 4.2. [Major National Scheme 2 for {area}]",
                text: "Similar extensive analysis, achievements - *consider a chart for a key \
                       performance indicator like IMR/MMR reduction under the scheme if data is \
                       directly attributable*.",
            },
            Instruction::Subsection {
                heading: "### 4.3. Other Key Local/Regional Schemes & Public Health Programs",
                text: "Describe scope, impact.",
            },
        ],
    },
    SectionDef {
        key: "healthcare_system",
        title: "5. Healthcare Infrastructure & System in {area}",
        instructions: &[
            Instruction::Subsection {
                heading: "### 5.1. Healthcare Facilities",
                text: "Detail availability, distribution, quality of facilities. Quantitative \
                       data on numbers, bed strength - *bar chart comparing facility types or \
                       beds per 1000 in different regions if feasible*.",
            },
            Instruction::Subsection {
                heading: "### 5.2. Human Resources for Health (HRH)",
                text: "Discuss availability, density, distribution of health workers. \
                       Doctor-population ratios, nurse-population ratios - *bar chart comparing \
                       HRH density to benchmarks or across regions*.",
            },
            Instruction::Subsection {
                heading: "### 5.3. Health Financing & Expenditure",
                text: "Describe financing sources. Health expenditure as % of GDP, OOP - *pie \
                       chart for health expenditure breakdown by source; line chart for OOP \
                       trend*.",
            },
            Instruction::Subsection {
                heading: "### 5.4. Access to Care & Health Equity",
                text: "Analyze access issues, disparities.",
            },
            Instruction::Subsection {
                heading: "### 5.5. Pharmaceutical Sector & Supply Chain Management",
                text: "Discuss pharma industry, drug procurement, availability of essential \
                       medicines.",
            },
            Instruction::Subsection {
                heading: "### 5.6. Health Information Systems (HIS) & Digital Health Initiatives",
                text: "Describe state of HIS, use of digital health technologies.",
            },
        ],
    },
    SectionDef {
        key: "challenges_recommendations",
        title: "6. Key Challenges, Opportunities, and Strategic Recommendations for {area}",
        instructions: &[
            Instruction::Subsection {
                heading: "### 6.1. Major Health System Challenges",
                text: "Synthesize and discuss key problems.",
            },
            Instruction::Subsection {
                heading: "### 6.2. Opportunities for Improvement",
                text: "Identify strengths and potential levers.",
            },
            Instruction::Subsection {
                heading: "### 6.3. Strategic, Actionable, and Evidence-Informed Recommendations",
                text: "Propose 3-5 recommendations.",
            },
        ],
    },
    SectionDef {
        key: "conclusion",
        title: "7. Conclusion",
        instructions: &[
            Instruction::Point(
                "Summarize main findings, reiterate key status, challenges, opportunities.",
            ),
            Instruction::Point("Offer insightful future outlook for health in **'{area}'**."),
        ],
    },
    SectionDef {
        key: "references",
        title: "References",
        instructions: &[Instruction::Point(
            "Provide a comprehensive list of all cited sources alphabetically.",
        )],
    },
];

/// Renders the report title for an area.
#[must_use]
pub fn report_title(area: &str) -> String {
    REPORT_TITLE_TEMPLATE.replace(AREA, area)
}

/// Builds the report prompt for `area`, dated with `date`'s month and
/// year.
///
/// The output depends only on its arguments.
#[must_use]
pub fn build_report_prompt(area: &str, date: NaiveDate) -> String {
    let fill = |template: &str| template.replace(AREA, area);

    let mut prompt = format!(
        r#"**CRITICAL INSTRUCTION: YOUR ENTIRE RESPONSE MUST BE ONLY THE REPORT CONTENT. START *EXACTLY* WITH THE FOLLOWING TITLE AND DATE, THEN THE "Contents" HEADING. DO NOT ADD ANY OTHER TEXT BEFORE THIS.**
**If you have any internal planning, thoughts, or self-correction steps during generation, you MUST enclose them in <think>...</think> tags. These tags and their content will be programmatically removed and MUST NOT appear in the final report body.**

## {title}
{date}

## Contents
*(You will generate the list of sections here, like "1. Introduction", "  1.1. Subsection X", etc. DO NOT include page numbers in the Table of Contents. Ensure each main section from the guide below has an entry.)*

---

**MAIN REPORT BODY INSTRUCTIONS:**
Following the Table of Contents (which you will generate based on the H2 and H3 headings below), proceed to generate the full report content.
The report MUST be AT LEAST **5000 WORDS** (or as extensively detailed as possible for '{area}').
Use ONLY certified and official sources of data. AIM TO INCLUDE SEVERAL RELEVANT CHARTS THROUGHOUT THE REPORT AS GUIDED.
**Remember to use <think>...</think> for any internal thought processes or meta-commentary that are not part of the report itself. These will be stripped out.**

**Overall Markdown Formatting:**
- Main sections MUST use H2 Markdown headings (e.g., `## 1. Introduction`).
- Subsections within main sections MUST use H3 Markdown headings (e.g., `### 1.1. Overview of {area}'s Demographics`).
- **FOR EACH SUBSECTION, provide THOROUGH and IN-DEPTH analysis, discussion, and detailed information. Do not be brief. Elaborate extensively, drawing on multiple data points and explaining their significance.**

**Detailed Content Guide for Each Section:**
"#,
        title = report_title(area),
        date = date.format("%B %Y"),
    );

    for section in SECTIONS {
        let title = fill(section.title);
        write!(prompt, "\n## {title}\n").unwrap();

        if section.instructions.is_empty() {
            writeln!(
                prompt,
                "- (Provide comprehensive information for this section: {title})"
            )
            .unwrap();
        }

        for instruction in section.instructions {
            match instruction {
                Instruction::Point(text) => {
                    writeln!(prompt, "- {}", fill(text)).unwrap();
                }
                Instruction::Subsection { heading, text } => {
                    writeln!(prompt, "{}\n- {}", fill(heading), fill(text)).unwrap();
                }
            }
        }
    }

    write!(
        prompt,
        r#"
**General Content Style:**
- Provide EXTREMELY IN-DEPTH analysis, not just lists. Explain data significance. Aim for a total report length of AT LEAST 5000 WORDS.
- Integrate statistics smoothly and extensively.
- Use bullet points (`* item`) for lists where appropriate, but main content should be detailed prose.

**Tables:**
- Include data in Markdown tables where relevant. Caption *above* table: "Table X: Description for {area}."

**Charts and Graphs (Data Provision - INCLUDE PLENTY OF RELEVANT CHARTS):**
- Actively look for opportunities to include charts to visualize data, trends, and comparisons. The more relevant charts, the better.
- For EACH chart, provide data ON ITS OWN LINE, immediately after the paragraph discussing it:
    `CHART_DATA: TYPE=[bar|line|pie|doughnut] TITLE="Chart Title for {area}" LABELS=["L1","L2"] DATA=[V1,V2] SOURCE="(Source, Year)"`
- Use exactly one DATA list per CHART_DATA line, with the same number of entries as LABELS.
- Chart data arrays (LABELS, DATA) should be concise (3-10 points).

**Citations:**
- ALL data/claims MUST be attributed in-text: `(Author/Organization, Year)`.

**Final Section - References:**
- The last H2 section of the report MUST be `## References`.
- List all cited sources alphabetically with full details.

**ABSOLUTELY NO TEXT, THOUGHTS, PLANNING, OR PREFATORY REMARKS BEFORE THE MAIN REPORT TITLE. YOUR RESPONSE IS ONLY THE REPORT CONTENT AS SPECIFIED. All internal thoughts or meta-commentary MUST be in <think>...</think> tags.**
"#
    )
    .unwrap();

    prompt
}
