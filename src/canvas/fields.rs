//! The nine building blocks of a business model canvas.
//!
//! Each field carries the label used in the canvas description, the question
//! asked when collecting it, a short guide of what to cover, and an example
//! answer that can seed a template.

use serde::{Deserialize, Serialize};

// ============================================================================
// Canvas Fields
// ============================================================================

/// One of the nine canvas building blocks, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasField {
    ValueProposition,
    CustomerProfile,
    DistributionChannel,
    CustomerRelationship,
    RevenueStreams,
    KeyResources,
    KeyActivities,
    KeyPartners,
    CostStructure,
}

impl CanvasField {
    /// All fields in the order they appear in the canvas description.
    pub const ALL: [CanvasField; 9] = [
        CanvasField::ValueProposition,
        CanvasField::CustomerProfile,
        CanvasField::DistributionChannel,
        CanvasField::CustomerRelationship,
        CanvasField::RevenueStreams,
        CanvasField::KeyResources,
        CanvasField::KeyActivities,
        CanvasField::KeyPartners,
        CanvasField::CostStructure,
    ];

    /// Stable identifier, used as the JSON key on export.
    pub fn id(&self) -> &'static str {
        match self {
            Self::ValueProposition => "value_proposition",
            Self::CustomerProfile => "customer_profile",
            Self::DistributionChannel => "distribution_channel",
            Self::CustomerRelationship => "customer_relationship",
            Self::RevenueStreams => "revenue_streams",
            Self::KeyResources => "key_resources",
            Self::KeyActivities => "key_activities",
            Self::KeyPartners => "key_partners",
            Self::CostStructure => "cost_structure",
        }
    }

    /// Label written in front of the field in the canvas description.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ValueProposition => "Value proposition",
            Self::CustomerProfile => "Customer profile",
            Self::DistributionChannel => "Distribution channel",
            Self::CustomerRelationship => "Customer relationship",
            Self::RevenueStreams => "Revenue streams",
            Self::KeyResources => "Key resources",
            Self::KeyActivities => "Key activities",
            Self::KeyPartners => "Key partners",
            Self::CostStructure => "Cost structure",
        }
    }

    /// Question shown to the user when collecting this field.
    pub fn question(&self) -> &'static str {
        match self {
            Self::ValueProposition => "What is the value proposition for your business model?",
            Self::CustomerProfile => {
                "Please provide a description of the customer segment that you are targeting"
            }
            Self::DistributionChannel => {
                "Please provide a description of the distribution channel that you are using"
            }
            Self::CustomerRelationship => {
                "Please provide a description of the customer relationship that you are building"
            }
            Self::RevenueStreams => {
                "Please provide a description of the revenue streams that you are generating"
            }
            Self::KeyResources => {
                "Please provide a description of the key resources that you are using"
            }
            Self::KeyActivities => {
                "Please provide a description of the key activities that you are performing"
            }
            Self::KeyPartners => {
                "Please provide a description of the key partners that you are working with"
            }
            Self::CostStructure => {
                "Please provide a description of the cost structure that you are facing"
            }
        }
    }

    /// Guidance on what the answer should cover.
    pub fn help(&self) -> &'static str {
        match self {
            Self::ValueProposition => VALUE_PROPOSITION_HELP,
            Self::CustomerProfile => CUSTOMER_PROFILE_HELP,
            Self::DistributionChannel => DISTRIBUTION_CHANNEL_HELP,
            Self::CustomerRelationship => CUSTOMER_RELATIONSHIP_HELP,
            Self::RevenueStreams => REVENUE_STREAMS_HELP,
            Self::KeyResources => KEY_RESOURCES_HELP,
            Self::KeyActivities => KEY_ACTIVITIES_HELP,
            Self::KeyPartners => KEY_PARTNERS_HELP,
            Self::CostStructure => COST_STRUCTURE_HELP,
        }
    }

    /// Example answer for a fictional process-automation software company.
    pub fn example(&self) -> &'static str {
        match self {
            Self::ValueProposition => {
                "Example: Our innovative software solution automates business process management, \
                 reducing operational costs by 40% while improving accuracy and efficiency."
            }
            Self::CustomerProfile => {
                "Example: Mid to large-sized enterprises (100+ employees) in the manufacturing sector, \
                 specifically operations and process managers looking to optimize their workflow."
            }
            Self::DistributionChannel => {
                "Example: Direct sales through our website and enterprise sales team, \
                 plus partnerships with major consulting firms for broader market reach."
            }
            Self::CustomerRelationship => {
                "Example: Dedicated account managers for enterprise clients, \
                 24/7 technical support, and regular check-ins to ensure customer success."
            }
            Self::RevenueStreams => {
                "Example: Monthly subscription model ($500-2000/month based on users), \
                 implementation services ($5000-20000), and premium support packages."
            }
            Self::KeyResources => {
                "Example: Proprietary automation software, cloud infrastructure, \
                 skilled development team, and established client relationships."
            }
            Self::KeyActivities => {
                "Example: Software development and updates, customer support, \
                 sales and marketing, and continuous platform improvement."
            }
            Self::KeyPartners => {
                "Example: Cloud service providers (AWS, Azure), \
                 consulting firms for implementation, and technology vendors for integrations."
            }
            Self::CostStructure => {
                "Example: Development team salaries (40%), cloud infrastructure (20%), \
                 sales and marketing (25%), customer support (15%)."
            }
        }
    }

    /// Looks up a field by its identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }
}

impl std::fmt::Display for CanvasField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Help Texts
// ============================================================================

const VALUE_PROPOSITION_HELP: &str = "What value do you deliver to the customer? Which customer needs are you satisfying?
• Products and services you offer
• Pain relievers and gain creators
• Unique selling points
• Why customers should choose you over competitors";

const CUSTOMER_PROFILE_HELP: &str = "Who are your most important customers? For whom are you creating value?
• Target market demographics
• User personas
• Market size and characteristics
• Customer pain points and gains";

const DISTRIBUTION_CHANNEL_HELP: &str = "How do you reach your customers? Through which channels do your customer segments want to be reached?
• Sales channels (direct/indirect)
• Marketing channels
• Communication channels
• Physical/digital presence
• Customer touchpoints";

const CUSTOMER_RELATIONSHIP_HELP: &str = "What type of relationship does each customer segment expect you to establish and maintain?
• Personal assistance
• Self-service
• Automated services
• Communities
• Co-creation
• Customer support strategy";

const REVENUE_STREAMS_HELP: &str = "For what value are your customers willing to pay? How do they currently pay?
• Pricing models
• Payment methods
• Revenue sources
• Pricing strategy
• Recurring vs one-time revenues";

const KEY_RESOURCES_HELP: &str = "What key resources does your value proposition require?
• Physical assets
• Intellectual property
• Human resources
• Financial resources
• Technology infrastructure
• Brand and reputation";

const KEY_ACTIVITIES_HELP: &str = "What key activities does your value proposition require?
• Production
• Problem solving
• Platform/Network
• Research & Development
• Marketing & Sales
• Supply chain management";

const KEY_PARTNERS_HELP: &str = "Who are your key partners and suppliers? What key resources are you acquiring from them?
• Strategic alliances
• Supplier relationships
• Joint ventures
• Coopetition
• Key suppliers and their roles";

const COST_STRUCTURE_HELP: &str = "What are the most important costs inherent in your business model?
• Fixed costs
• Variable costs
• Economies of scale
• Cost-driven vs value-driven
• Major cost centers
• Cost optimization opportunities";
