//! Structural checks over an encoded payload, run before any network
//! call.

/// Returns the list of structural problems; empty means the payload is
/// safe to transmit. Checks envelope presence, ST/SE pairing, and the
/// SE segment count.
pub fn prevalidate(payload: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let segments: Vec<&str> = payload
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    for required in ["ISA", "GS", "ST", "SE", "GE", "IEA"] {
        if !segments.iter().any(|s| segment_id(s) == required) {
            problems.push(format!("Missing required segment: {required}"));
        }
    }

    let st_count = segments.iter().filter(|s| segment_id(s) == "ST").count();
    let se_count = segments.iter().filter(|s| segment_id(s) == "SE").count();
    if st_count != se_count {
        problems.push(format!(
            "Unbalanced transaction envelope: {st_count} ST segment(s), {se_count} SE segment(s)"
        ));
    }

    // SE01 must count every segment up to and including SE itself.
    if let Some(se_index) = segments.iter().position(|s| segment_id(s) == "SE") {
        let declared = segments[se_index]
            .trim_end_matches('~')
            .split('*')
            .nth(1)
            .and_then(|v| v.parse::<usize>().ok());
        match declared {
            Some(count) if count == se_index + 1 => {}
            Some(count) => problems.push(format!(
                "SE segment count {count} does not match {} transaction segments",
                se_index + 1
            )),
            None => problems.push("SE segment carries no numeric count".to_string()),
        }
    }

    problems
}

fn segment_id(segment: &str) -> &str {
    segment.split('*').next().unwrap_or("")
}

#[cfg(test)]
pub(crate) fn minimal_payload() -> String {
    let body = [
        "GS*HC*S*R*20260301*1200*1*X*005010X222A1~",
        "ST*837*0001~",
        "BHT*0019*00*CLM-1*20260301*1200*CH~",
        "CLM*CLM-1*250.00***81:B:1*Y*A*Y*Y~",
        "HI*ABK:E119~",
    ];
    let mut lines = vec![
        "ISA*00*          *00*          *ZZ*S*ZZ*R*260301*1200*^*00501*000000001*0*T*:~"
            .to_string(),
    ];
    lines.extend(body.iter().map(|s| s.to_string()));
    // SE counts ISA through SE inclusive.
    lines.push(format!("SE*{}*0001~", lines.len() + 1));
    lines.push("GE*1*1~".to_string());
    lines.push("IEA*1*1~".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_payload_has_no_problems() {
        assert!(prevalidate(&minimal_payload()).is_empty());
    }

    #[test]
    fn missing_envelope_segments_are_reported() {
        let payload = minimal_payload().replace("IEA*1*1~", "");
        let problems = prevalidate(&payload);
        assert!(problems.iter().any(|p| p.contains("IEA")));
    }

    #[test]
    fn st_se_imbalance_is_reported() {
        let payload = minimal_payload().replace("ST*837*0001~", "");
        let problems = prevalidate(&payload);
        assert!(problems
            .iter()
            .any(|p| p.contains("Unbalanced transaction envelope")));
    }

    #[test]
    fn wrong_se_count_is_reported() {
        let payload = minimal_payload().replace("SE*7*0001~", "SE*99*0001~");
        let problems = prevalidate(&payload);
        assert!(problems.iter().any(|p| p.contains("SE segment count 99")));
    }
}
