/// Application-level "service unavailable" signature.
///
/// The service sometimes answers with a 200-level envelope whose text
/// carries the 503 status instead of an HTTP error. Any body containing the
/// literal `503` counts as a failed attempt. This also matches payloads that
/// merely contain those digits, so keep the check here and nowhere else.
pub fn is_service_unavailable(body: &[u8]) -> bool {
    body.windows(UNAVAILABLE_SIGNATURE.len())
        .any(|window| window == UNAVAILABLE_SIGNATURE)
}

const UNAVAILABLE_SIGNATURE: &[u8] = b"503";
