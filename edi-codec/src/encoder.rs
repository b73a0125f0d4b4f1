//! 837P segment stream builder.

use crate::config::EdiConfig;
use crate::error::{EdiError, EdiResult};
use crate::segments::{
    fixed_width, fmt_amount, fmt_date, fmt_date_short, fmt_time, Segment, COMPONENT_SEPARATOR,
};
use chrono::NaiveDateTime;
use claims_core::{aggregate_diagnosis_codes, Claim, ClaimLine, Gender, InsurancePlan, Patient};
use rand::Rng;
use std::collections::HashMap;

/// X12 caps the HI segment at twelve diagnosis codes.
pub const MAX_HI_CODES: usize = 12;

/// Everything the encoder reads. The patient defaults to the subscriber;
/// `patient_override` is the explicit non-subscriber patient.
#[derive(Debug, Clone)]
pub struct ClaimGraph<'a> {
    pub claim: &'a Claim,
    pub lines: &'a [ClaimLine],
    pub subscriber: &'a Patient,
    pub plan: &'a InsurancePlan,
    pub patient_override: Option<&'a Patient>,
    pub prior_auth_number: Option<String>,
    pub referral_number: Option<String>,
    /// Line number → NPI, for lines rendered by a provider other than the
    /// billing provider.
    pub rendering_providers: HashMap<u32, String>,
}

impl<'a> ClaimGraph<'a> {
    pub fn new(
        claim: &'a Claim,
        lines: &'a [ClaimLine],
        subscriber: &'a Patient,
        plan: &'a InsurancePlan,
    ) -> Self {
        Self {
            claim,
            lines,
            subscriber,
            plan,
            patient_override: None,
            prior_auth_number: None,
            referral_number: None,
            rendering_providers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdiDocument {
    /// Full segment stream, one `~`-terminated segment per line.
    pub content: String,
    pub control_number: String,
    /// Total segments emitted, envelope included.
    pub segment_count: usize,
    /// Artifact name: `{claimNumber}.edi`.
    pub file_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Edi837Encoder {
    config: EdiConfig,
}

impl Edi837Encoder {
    pub fn new(config: EdiConfig) -> Self {
        Self { config }
    }

    /// Render the claim graph as an 837P interchange. Deterministic for a
    /// fixed control number; a fresh control number is generated when the
    /// caller supplies none.
    pub fn encode(
        &self,
        graph: &ClaimGraph<'_>,
        control_number: Option<String>,
    ) -> EdiResult<EdiDocument> {
        let claim = graph.claim;
        if claim.claim_number.trim().is_empty() {
            return Err(EdiError::MissingField("claim_number"));
        }

        // Claim-level diagnosis list: deduplicated, undotted, capped.
        let diagnoses: Vec<String> = aggregate_diagnosis_codes(graph.lines)
            .iter()
            .map(|c| undot(c))
            .take(MAX_HI_CODES)
            .collect();
        if diagnoses.is_empty() {
            return Err(EdiError::MissingDiagnosis {
                claim_number: claim.claim_number.clone(),
            });
        }

        let control = control_number.unwrap_or_else(generate_control_number);
        let stamp = interchange_stamp(&control, claim);
        let cfg = &self.config;

        let mut segs: Vec<Segment> = Vec::new();

        // Interchange and group envelope. ISA is fixed-width.
        segs.push(Segment::new(
            "ISA",
            [
                "00".to_string(),
                fixed_width("", 10),
                "00".to_string(),
                fixed_width("", 10),
                cfg.sender_qualifier.clone(),
                fixed_width(&cfg.sender_id, 15),
                cfg.receiver_qualifier.clone(),
                fixed_width(&cfg.receiver_id, 15),
                fmt_date_short(stamp.date()),
                fmt_time(stamp),
                "^".to_string(),
                "00501".to_string(),
                format!("{control:0>9}"),
                "0".to_string(),
                cfg.usage.code().to_string(),
                COMPONENT_SEPARATOR.to_string(),
            ],
        ));
        segs.push(Segment::new(
            "GS",
            [
                "HC".to_string(),
                cfg.sender_id.clone(),
                cfg.receiver_id.clone(),
                fmt_date(stamp.date()),
                fmt_time(stamp),
                control.clone(),
                "X".to_string(),
                cfg.version.clone(),
            ],
        ));
        segs.push(Segment::new("ST", ["837", "0001", cfg.version.as_str()]));
        segs.push(Segment::new(
            "BHT",
            [
                "0019".to_string(),
                "00".to_string(),
                claim.claim_number.clone(),
                fmt_date(stamp.date()),
                fmt_time(stamp),
                "CH".to_string(),
            ],
        ));

        // Submitter / receiver names.
        segs.push(Segment::new(
            "NM1",
            ["41", "2", &cfg.submitter_name, "", "", "", "", "46", &cfg.sender_id],
        ));
        segs.push(Segment::new(
            "PER",
            [
                "IC",
                &cfg.billing_provider.contact_name,
                "TE",
                &cfg.billing_provider.contact_phone,
            ],
        ));
        segs.push(Segment::new(
            "NM1",
            ["40", "2", &cfg.receiver_name, "", "", "", "", "46", &cfg.receiver_id],
        ));

        // Billing provider loop.
        let provider = &cfg.billing_provider;
        segs.push(Segment::new("HL", ["1", "", "20", "1"]));
        segs.push(Segment::new(
            "NM1",
            ["85", "2", &provider.org_name, "", "", "", "", "XX", &provider.npi],
        ));
        segs.push(Segment::new("N3", [provider.address_line.as_str()]));
        segs.push(Segment::new(
            "N4",
            [&provider.city, &provider.state, &provider.zip],
        ));
        segs.push(Segment::new("REF", ["EI", &provider.tax_id]));
        segs.push(Segment::new(
            "PER",
            ["IC", &provider.contact_name, "TE", &provider.contact_phone],
        ));

        // Subscriber loop. HL04 signals whether a child patient loop
        // follows.
        let has_patient_loop = graph.patient_override.is_some();
        segs.push(Segment::new(
            "HL",
            ["2", "1", "22", if has_patient_loop { "1" } else { "0" }],
        ));
        segs.push(Segment::new(
            "SBR",
            [
                "P",
                if has_patient_loop { "" } else { "18" },
                graph.plan.group_number.as_deref().unwrap_or(""),
                "",
                "",
                "",
                "",
                "",
                "CI",
            ],
        ));
        segs.push(Segment::new(
            "NM1",
            [
                "IL",
                "1",
                &graph.subscriber.last_name,
                &graph.subscriber.first_name,
                "",
                "",
                "",
                "MI",
                &graph.plan.member_id,
            ],
        ));
        push_address(&mut segs, graph.subscriber);
        push_demographics(&mut segs, graph.subscriber);
        segs.push(Segment::new(
            "NM1",
            ["PR", "2", &graph.plan.payer_name, "", "", "", "", "PI", &graph.plan.payer_id],
        ));

        // Patient loop only when the patient differs from the subscriber.
        if let Some(patient) = graph.patient_override {
            segs.push(Segment::new("HL", ["3", "2", "23", "0"]));
            segs.push(Segment::new("PAT", ["19"]));
            segs.push(Segment::new(
                "NM1",
                ["QC", "1", &patient.last_name, &patient.first_name],
            ));
            push_address(&mut segs, patient);
            push_demographics(&mut segs, patient);
        }

        // Claim loop. CLM05 is the place-of-service / frequency composite.
        segs.push(Segment::new(
            "CLM",
            [
                claim.claim_number.clone(),
                fmt_amount(claim.total_charge),
                String::new(),
                String::new(),
                format!("81{COMPONENT_SEPARATOR}B{COMPONENT_SEPARATOR}1"),
                "Y".to_string(),
                "A".to_string(),
                "Y".to_string(),
                "Y".to_string(),
            ],
        ));
        if let Some(referral) = &graph.referral_number {
            segs.push(Segment::new("REF", ["9F", referral.as_str()]));
        }
        if let Some(auth) = &graph.prior_auth_number {
            segs.push(Segment::new("REF", ["G1", auth.as_str()]));
        }
        if let Some(earliest) = graph.lines.iter().map(|l| l.service_date).min() {
            segs.push(Segment::new("DTP", ["472", "D8", &fmt_date(earliest)]));
        }

        // HI: first code qualified ABK, the rest ABF.
        let hi: Vec<String> = diagnoses
            .iter()
            .enumerate()
            .map(|(idx, code)| {
                let qualifier = if idx == 0 { "ABK" } else { "ABF" };
                format!("{qualifier}{COMPONENT_SEPARATOR}{code}")
            })
            .collect();
        segs.push(Segment::new("HI", hi));

        // Service lines, ordered by line number.
        let mut ordered: Vec<&ClaimLine> = graph.lines.iter().collect();
        ordered.sort_by_key(|l| l.line_number);
        for line in ordered {
            segs.push(Segment::new("LX", [line.line_number.to_string()]));

            let mut procedure = format!("HC{COMPONENT_SEPARATOR}{}", line.cpt_code);
            if let Some(modifier) = &line.modifier {
                procedure.push(COMPONENT_SEPARATOR);
                procedure.push_str(modifier);
            }
            segs.push(Segment::new(
                "SV1",
                [
                    procedure,
                    fmt_amount(line.charge),
                    "UN".to_string(),
                    line.units.to_string(),
                    String::new(),
                    String::new(),
                    diagnosis_pointers(line, &diagnoses),
                ],
            ));
            segs.push(Segment::new(
                "DTP",
                ["472", "D8", &fmt_date(line.service_date)],
            ));
            if let Some(npi) = graph.rendering_providers.get(&line.line_number) {
                segs.push(Segment::new(
                    "NM1",
                    ["82", "1", "", "", "", "", "", "XX", npi.as_str()],
                ));
            }
        }

        // Trailers. SE01 = segments emitted so far, plus one.
        let se_count = segs.len() + 1;
        segs.push(Segment::new("SE", [se_count.to_string(), "0001".to_string()]));
        segs.push(Segment::new("GE", ["1", control.as_str()]));
        segs.push(Segment::new("IEA", ["1", control.as_str()]));

        let mut content = String::new();
        for seg in &segs {
            content.push_str(&seg.render());
            content.push('\n');
        }

        tracing::debug!(
            claim_number = %claim.claim_number,
            control = %control,
            segments = segs.len(),
            "claim encoded"
        );
        Ok(EdiDocument {
            content,
            control_number: control,
            segment_count: segs.len(),
            file_name: format!("{}.edi", claim.claim_number),
        })
    }
}

fn push_address(segs: &mut Vec<Segment>, person: &Patient) {
    if let Some(line) = &person.address_line {
        segs.push(Segment::new("N3", [line.as_str()]));
    }
    if let Some(city) = &person.city {
        segs.push(Segment::new(
            "N4",
            [
                city.as_str(),
                person.state.as_deref().unwrap_or(""),
                person.zip.as_deref().unwrap_or(""),
            ],
        ));
    }
}

fn push_demographics(segs: &mut Vec<Segment>, person: &Patient) {
    if let Some(dob) = person.date_of_birth {
        let gender = match person.gender {
            Some(Gender::Male) => "M",
            Some(Gender::Female) => "F",
            _ => "U",
        };
        segs.push(Segment::new("DMG", ["D8", &fmt_date(dob), gender]));
    }
}

/// 1-based positions of the line's diagnoses in the claim-level list, up
/// to four. Falls back to the primary diagnosis when none survived the
/// cap.
fn diagnosis_pointers(line: &ClaimLine, claim_diagnoses: &[String]) -> String {
    let mut pointers: Vec<String> = Vec::new();
    for code in &line.diagnosis_codes {
        if let Some(pos) = claim_diagnoses.iter().position(|c| *c == undot(code)) {
            let pointer = (pos + 1).to_string();
            if !pointers.contains(&pointer) {
                pointers.push(pointer);
            }
        }
    }
    pointers.truncate(4);
    if pointers.is_empty() {
        "1".to_string()
    } else {
        pointers.join(&COMPONENT_SEPARATOR.to_string())
    }
}

/// X12 carries diagnosis codes without the decimal separator.
fn undot(code: &str) -> String {
    code.replace('.', "")
}

/// ISA/GS timestamps derive from the control number's leading
/// `YYYYMMDDHHMMSS` when present, otherwise from the claim's creation
/// time. Either way the output is stable for a fixed control number.
fn interchange_stamp(control: &str, claim: &Claim) -> NaiveDateTime {
    if control.len() >= 14 {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(&control[..14], "%Y%m%d%H%M%S") {
            return stamp;
        }
    }
    claim.created_at.naive_utc()
}

/// `localTimestamp(YYYYMMDDHHMMSS)` + 3 random digits.
pub fn generate_control_number() -> String {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{stamp}{suffix:03}")
}
