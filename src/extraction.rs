//! Order-type field schemas and extraction prompts
//!
//! The model call itself lives behind [`FieldExtractor`]; this module only
//! decides what is asked and checks what comes back.

use crate::config::EvidenceConfig;
use crate::error::{EvidenceError, Result};
use crate::render::render_evidence;
use crate::types::EvidencePack;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::info;

/// Value type the model is asked to produce for a field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    Array,
    Address,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Address => "address",
        };
        f.write_str(name)
    }
}

const fn default_required() -> bool {
    true
}

/// One field to extract
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDef {
    pub key: String,
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default = "default_required")]
    pub required: bool,

    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl FieldDef {
    fn new(
        key: &str,
        label: &str,
        field_type: FieldType,
        required: bool,
        description: &str,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required,
            description: description.into(),
            examples: Vec::new(),
        }
    }

    fn with_examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(ToString::to_string).collect();
        self
    }

    /// `- key (Label): [type] REQUIRED — description Examples: a, b`
    #[must_use]
    pub fn prompt_line(&self) -> String {
        let mut line = format!(
            "- {} ({}): [{}] {} — {}",
            self.key,
            self.label,
            self.field_type,
            if self.required { "REQUIRED" } else { "optional" },
            self.description
        );
        if !self.examples.is_empty() {
            line.push_str(" Examples: ");
            line.push_str(&self.examples.join(", "));
        }
        line
    }
}

/// Extraction schema for one kind of order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderTypeConfig {
    pub order_type: String,
    pub label: String,
    pub description: String,
    pub fields: Vec<FieldDef>,
}

impl OrderTypeConfig {
    /// Field list as it appears in the prompt
    #[must_use]
    pub fn fields_prompt(&self) -> String {
        self.fields
            .iter()
            .map(FieldDef::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Known order types, looked up by key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct OrderTypeRegistry {
    types: Vec<OrderTypeConfig>,
}

impl Default for OrderTypeRegistry {
    fn default() -> Self {
        Self {
            types: builtin_order_types(),
        }
    }
}

impl OrderTypeRegistry {
    #[must_use]
    pub const fn new(types: Vec<OrderTypeConfig>) -> Self {
        Self { types }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EvidenceError::Config(e.to_string()))
    }

    pub fn get(&self, order_type: &str) -> Result<&OrderTypeConfig> {
        self.types
            .iter()
            .find(|c| c.order_type == order_type)
            .ok_or_else(|| EvidenceError::UnknownOrderType {
                requested: order_type.to_string(),
                available: self.keys().join(", "),
            })
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.types.iter().map(|c| c.order_type.as_str()).collect()
    }
}

/// Built-in schemas: sales orders, incoming shipments, service cases, and
/// mail needing no action
#[must_use]
pub fn builtin_order_types() -> Vec<OrderTypeConfig> {
    use FieldType::{Address, Array, Date, Number, String as Text};

    vec![
        OrderTypeConfig {
            order_type: "sales_order".into(),
            label: "Sales Order".into(),
            description: "A customer order for products/services with quantities and prices".into(),
            fields: vec![
                FieldDef::new(
                    "customerName",
                    "Customer Name",
                    Text,
                    true,
                    "Full name or company name of the customer placing the order",
                ),
                FieldDef::new(
                    "orderDate",
                    "Order Date",
                    Date,
                    true,
                    "Date the order was placed (ISO 8601 format)",
                ),
                FieldDef::new(
                    "deliveryDate",
                    "Requested Delivery Date",
                    Date,
                    false,
                    "When the customer wants delivery (ISO 8601 format)",
                ),
                FieldDef::new(
                    "lineItems",
                    "Line Items",
                    Array,
                    true,
                    "Array of objects with: sku, description, quantity, unitPrice",
                ),
                FieldDef::new(
                    "totalAmount",
                    "Total Amount",
                    Number,
                    false,
                    "Total order value as a number",
                ),
                FieldDef::new(
                    "shippingAddress",
                    "Shipping Address",
                    Address,
                    false,
                    "Delivery address with street, city, state/province, postal code, country",
                ),
                FieldDef::new(
                    "poNumber",
                    "PO Number",
                    Text,
                    false,
                    "Customer purchase order reference number",
                ),
            ],
        },
        OrderTypeConfig {
            order_type: "incoming_shipment".into(),
            label: "Incoming Shipment".into(),
            description:
                "A notification about goods being shipped to us (ASN, tracking, etc.)".into(),
            fields: vec![
                FieldDef::new(
                    "supplierName",
                    "Supplier Name",
                    Text,
                    true,
                    "Name of the supplier or vendor shipping goods",
                ),
                FieldDef::new(
                    "trackingNumber",
                    "Tracking Number",
                    Text,
                    false,
                    "Shipment tracking or AWB number",
                ),
                FieldDef::new(
                    "expectedArrival",
                    "Expected Arrival",
                    Date,
                    false,
                    "Expected delivery date (ISO 8601 format)",
                ),
                FieldDef::new(
                    "lineItems",
                    "Line Items",
                    Array,
                    true,
                    "Array of objects with: sku, description, quantity",
                ),
                FieldDef::new(
                    "referenceNumber",
                    "Reference Number",
                    Text,
                    false,
                    "Our PO number or supplier reference",
                ),
            ],
        },
        OrderTypeConfig {
            order_type: "service_case".into(),
            label: "Service Case".into(),
            description: "A customer complaint, return request, or support inquiry".into(),
            fields: vec![
                FieldDef::new(
                    "customerName",
                    "Customer Name",
                    Text,
                    true,
                    "Customer or company raising the issue",
                ),
                FieldDef::new(
                    "issueDescription",
                    "Issue Description",
                    Text,
                    true,
                    "Summary of the problem or request",
                ),
                FieldDef::new(
                    "originalOrderRef",
                    "Original Order Reference",
                    Text,
                    false,
                    "Reference to the original order (PO, order number)",
                ),
                FieldDef::new("priority", "Priority", Text, false, "Urgency level")
                    .with_examples(&["low", "medium", "high", "critical"]),
                FieldDef::new(
                    "requestedAction",
                    "Requested Action",
                    Text,
                    false,
                    "What the customer wants (replacement, refund, repair, etc.)",
                ),
            ],
        },
        OrderTypeConfig {
            order_type: "no_action".into(),
            label: "No Action Required".into(),
            description: "Newsletter, auto-reply, spam, or out-of-scope email".into(),
            fields: vec![FieldDef::new(
                "reason",
                "Reason",
                Text,
                true,
                "Why this email requires no action (spam, auto-reply, newsletter, etc.)",
            )],
        },
    ]
}

/// Build the extraction prompt for `pack` under `order_type`
#[must_use]
pub fn build_prompt(
    pack: &EvidencePack,
    order_type: &OrderTypeConfig,
    config: &EvidenceConfig,
) -> String {
    let evidence = render_evidence(pack, config);
    let fields = order_type.fields_prompt();

    format!(
        "Extract the following fields from this {label} evidence.

## Fields to Extract
{fields}

## Evidence
{evidence}

Return a JSON object with:
- orderType: \"{key}\"
- fields: array of {{ key, value, confidence, evidenceRef }} for each field above
- overallConfidence: weighted average of field confidences

Respond ONLY with valid JSON matching the extractionResult schema.",
        label = order_type.label,
        key = order_type.order_type,
    )
}

/// A field value proposed by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedField {
    pub key: String,

    #[serde(default)]
    pub value: Value,

    pub confidence: f64,

    /// Pointer back into the evidence, e.g. `Segment 1` or `Page 2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_ref: Option<String>,
}

/// Everything the model returned for one order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub order_type: String,
    pub fields: Vec<ExtractedField>,
    pub overall_confidence: f64,
}

impl ExtractionResult {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check order type and confidence ranges against the schema
    pub fn validate(&self, order_type: &OrderTypeConfig) -> Result<()> {
        if self.order_type != order_type.order_type {
            return Err(EvidenceError::InvalidExtraction(format!(
                "expected order type {}, got {}",
                order_type.order_type, self.order_type
            )));
        }

        if !(0.0..=1.0).contains(&self.overall_confidence) {
            return Err(EvidenceError::InvalidExtraction(format!(
                "overall confidence {} outside [0, 1]",
                self.overall_confidence
            )));
        }

        if let Some(field) = self
            .fields
            .iter()
            .find(|f| !(0.0..=1.0).contains(&f.confidence))
        {
            return Err(EvidenceError::InvalidExtraction(format!(
                "field {} confidence {} outside [0, 1]",
                field.key, field.confidence
            )));
        }

        Ok(())
    }

    /// Required fields that are absent or null
    #[must_use]
    pub fn missing_required<'a>(&self, order_type: &'a OrderTypeConfig) -> Vec<&'a str> {
        order_type
            .fields
            .iter()
            .filter(|def| def.required)
            .filter(|def| {
                !self
                    .fields
                    .iter()
                    .any(|f| f.key == def.key && !f.value.is_null())
            })
            .map(|def| def.key.as_str())
            .collect()
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&ExtractedField> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// The model behind extraction. Implementations are constructed by the
/// caller and passed in; none ship with this crate.
pub trait FieldExtractor {
    fn extract(&self, prompt: &str, order_type: &OrderTypeConfig) -> Result<ExtractionResult>;
}

/// Prompt the extractor for `order_type` and validate its answer
pub fn extract_fields(
    extractor: &dyn FieldExtractor,
    registry: &OrderTypeRegistry,
    pack: &EvidencePack,
    order_type: &str,
    config: &EvidenceConfig,
) -> Result<ExtractionResult> {
    let schema = registry.get(order_type)?;
    let prompt = build_prompt(pack, schema, config);
    let result = extractor.extract(&prompt, schema)?;
    result.validate(schema)?;

    info!(
        order_id = %pack.order_id,
        order_type,
        fields = result.fields.len(),
        confidence = result.overall_confidence,
        "Fields extracted"
    );

    Ok(result)
}
