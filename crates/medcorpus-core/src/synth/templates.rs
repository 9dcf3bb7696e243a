//! Per-hop-class template banks.
//!
//! Every bank is a fixed, ordered list of rules. Rules are independent and
//! cumulative: each one looks at the fields it needs and renders zero, one
//! or two sentences. A rule's second ("richer") sentence embeds a cleaned
//! description, lower-cased where it is spliced into the sentence.
//!
//! Templates are written in Vietnamese, the language of the corpus.

use crate::models::{fields, HopClass, PathRecord};
use crate::synth::clean::clean_opt;

/// Fields shared by every rule of a record, resolved once.
struct RuleInput<'a> {
    record: &'a PathRecord,
    disease: &'a str,
    disease_desc: Option<String>,
}

impl<'a> RuleInput<'a> {
    fn field(&self, name: &str) -> Option<&'a str> {
        self.record.get(name)
    }

    fn cleaned(&self, name: &str) -> Option<String> {
        clean_opt(self.record.get(name))
    }
}

pub struct TemplateRule {
    pub name: &'static str,
    /// Upper bound on sentences this rule emits for one record.
    pub max_sentences: usize,
    render: fn(&RuleInput<'_>, &mut Vec<String>),
}

impl std::fmt::Debug for TemplateRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRule")
            .field("name", &self.name)
            .field("max_sentences", &self.max_sentences)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// 1-hop
// ---------------------------------------------------------------------------

fn drug_relation(input: &RuleInput<'_>, out: &mut Vec<String>) {
    let Some(drug) = input.field(fields::DRUG) else {
        return;
    };
    let d = input.disease;
    out.push(format!("{drug} là thuốc được chỉ định cho {d}."));
    if let Some(desc) = input.cleaned(fields::DRUG_DESC) {
        out.push(format!(
            "Thuốc {drug} ({}) được sử dụng để điều trị {d}.",
            desc.to_lowercase()
        ));
    }
}

fn group_membership(input: &RuleInput<'_>, out: &mut Vec<String>) {
    let Some(group) = input.field(fields::GROUP_NAME) else {
        return;
    };
    let d = input.disease;
    out.push(format!("{d} được phân loại thuộc nhóm {group}."));
    if let Some(desc) = input.cleaned(fields::GROUP_DESC) {
        out.push(format!(
            "Nhóm bệnh {group}, bao gồm {}, chứa các bệnh lý như {d}.",
            desc.to_lowercase()
        ));
    }
}

fn disease_description(input: &RuleInput<'_>, out: &mut Vec<String>) {
    let Some(desc) = input.disease_desc.as_deref() else {
        return;
    };
    let d = input.disease;
    out.push(format!(
        "Về mặt lâm sàng, {d} là tình trạng {}.",
        desc.to_lowercase()
    ));
    out.push(format!("Định nghĩa: {desc}."));
}

fn symptom_sign(input: &RuleInput<'_>, out: &mut Vec<String>) {
    if let Some(symptom) = input.field(fields::SYMPTOM) {
        out.push(format!(
            "Một trong những dấu hiệu của {} là {symptom}.",
            input.disease
        ));
    }
}

const ONE_HOP_RULES: &[TemplateRule] = &[
    TemplateRule {
        name: "drug_relation",
        max_sentences: 2,
        render: drug_relation,
    },
    TemplateRule {
        name: "group_membership",
        max_sentences: 2,
        render: group_membership,
    },
    TemplateRule {
        name: "disease_description",
        max_sentences: 2,
        render: disease_description,
    },
    TemplateRule {
        name: "symptom_sign",
        max_sentences: 1,
        render: symptom_sign,
    },
];

// ---------------------------------------------------------------------------
// 2-hop
// ---------------------------------------------------------------------------

fn treatment_context(input: &RuleInput<'_>, out: &mut Vec<String>) {
    let (Some(drug), Some(symptom)) = (input.field(fields::DRUG), input.field(fields::SYMPTOM))
    else {
        return;
    };
    let d = input.disease;
    match input.disease_desc.as_deref() {
        Some(desc) => out.push(format!(
            "Đối với {d} ({}), thuốc {drug} có thể được dùng khi bệnh nhân có biểu hiện {symptom}.",
            desc.to_lowercase()
        )),
        None => out.push(format!(
            "Bệnh nhân {d} có triệu chứng {symptom} thường được điều trị bằng {drug}."
        )),
    }
}

fn variant_grouping(input: &RuleInput<'_>, out: &mut Vec<String>) {
    let (Some(sub), Some(group)) = (
        input.field(fields::SUB_DISEASE),
        input.field(fields::GROUP_NAME),
    ) else {
        return;
    };
    let d = input.disease;
    out.push(format!("{sub} là một biến thể của {d}, nằm trong nhóm {group}."));
    if let Some(desc) = input.cleaned(fields::SUB_DESC) {
        out.push(format!(
            "{sub} ({}) được xếp vào nhóm {group} cùng với {d}.",
            desc.to_lowercase()
        ));
    }
}

const TWO_HOP_RULES: &[TemplateRule] = &[
    TemplateRule {
        name: "treatment_context",
        max_sentences: 1,
        render: treatment_context,
    },
    TemplateRule {
        name: "variant_grouping",
        max_sentences: 2,
        render: variant_grouping,
    },
];

// ---------------------------------------------------------------------------
// 3-hop
// ---------------------------------------------------------------------------

fn chapter_chain(input: &RuleInput<'_>, out: &mut Vec<String>) {
    let (Some(drug), Some(group), Some(chapter)) = (
        input.field(fields::DRUG),
        input.field(fields::GROUP_NAME),
        input.field(fields::CHAPTER_NAME),
    ) else {
        return;
    };
    let d = input.disease;
    out.push(format!(
        "Thuốc {drug} điều trị {d} (nhóm {group}), thuộc chương {chapter}."
    ));
    if let Some(desc) = input.cleaned(fields::CHAPTER_DESC) {
        out.push(format!(
            "Trong chương {chapter} ({}), {d} thuộc nhóm {group} và có thể điều trị bằng {drug}.",
            desc.to_lowercase()
        ));
    }
}

const THREE_HOP_RULES: &[TemplateRule] = &[TemplateRule {
    name: "chapter_chain",
    max_sentences: 2,
    render: chapter_chain,
}];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The ordered rule bank for `hop`.
pub fn rules(hop: HopClass) -> &'static [TemplateRule] {
    match hop {
        HopClass::OneHop => ONE_HOP_RULES,
        HopClass::TwoHop => TWO_HOP_RULES,
        HopClass::ThreeHop => THREE_HOP_RULES,
    }
}

/// Most sentences a single record of `hop` can expand into.
pub fn max_sentences_per_record(hop: HopClass) -> usize {
    rules(hop).iter().map(|r| r.max_sentences).sum()
}

/// Expand one path record into candidate sentences. A record without a
/// disease name expands to nothing.
pub fn expand(record: &PathRecord, hop: HopClass) -> Vec<String> {
    let Some(disease) = record.get(fields::DISEASE) else {
        return Vec::new();
    };
    let input = RuleInput {
        record,
        disease,
        disease_desc: clean_opt(record.get(fields::DISEASE_DESC)),
    };
    let mut out = Vec::new();
    for rule in rules(hop) {
        (rule.render)(&input, &mut out);
    }
    out
}
