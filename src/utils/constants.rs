//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

/// The service is known to shed load with "503" envelopes; ten tight
/// attempts is what the login flow has always used.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 0;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 0;

// Environment names
pub const ENV_PRODUCTION: &str = "production";
pub const ENV_CERTIFICATION: &str = "certification";

// Endpoints
pub const CERT_SEED_URL: &str = "https://maullin.sii.cl/DTEWS/CrSeed.jws";
pub const CERT_TOKEN_URL: &str = "https://maullin.sii.cl/DTEWS/GetTokenFromSeed.jws";
pub const PROD_SEED_URL: &str = "https://palena.sii.cl/DTEWS/CrSeed.jws";
pub const PROD_TOKEN_URL: &str = "https://palena.sii.cl/DTEWS/GetTokenFromSeed.jws";

// Template placeholders
pub const SEED_PLACEHOLDER: &str = "@seed";
pub const SIGNED_PLACEHOLDER: &str = "@pszXML";

pub const SEED_REQUEST_TEMPLATE: &str = r#"
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:def="http://DefaultNamespace">
  <soapenv:Header/>
  <soapenv:Body>
    <def:getSeed soapenv:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"/>
  </soapenv:Body>
</soapenv:Envelope>
"#;

pub const SIGNING_REQUEST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<getToken>
  <item>
    <Semilla>@seed</Semilla>
  </item>
</getToken>"#;

pub const TOKEN_REQUEST_TEMPLATE: &str = r#"
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:def="http://DefaultNamespace">
  <soapenv:Header/>
  <soapenv:Body>
    <def:getToken soapenv:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
      <pszXml xsi:type="xsd:string" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema"><![CDATA[@pszXML]]></pszXml>
    </def:getToken>
  </soapenv:Body>
</soapenv:Envelope>
"#;

// Signer child process environment
pub const SIGNER_CERTIFICATE_ENV: &str = "SII_CERTIFICATE_BASE64";
pub const SIGNER_PASSWORD_ENV: &str = "SII_CERTIFICATE_PASSWORD";
