use std::collections::HashMap;

use shared_config::{
    AppConfig, ChannelConfig, MessagingConfig, OwnerDefinition, ServiceDefinition, SmsAccount,
    ValidationRules,
};

pub const TEST_PAGER: &str = "test-pager";
pub const TEST_SMS: &str = "test-sms";

pub struct TestConfig {
    pub test_interval: u64,
    pub incident_endpoint: String,
    pub sms_api_url: String,
    pub connectivity_url: String,
    pub sms_recipients: HashMap<String, String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            test_interval: 1,
            incident_endpoint: "http://localhost:54321/create_event.json".to_string(),
            sms_api_url: "http://localhost:54322/Messages.json".to_string(),
            connectivity_url: "http://localhost:54323/".to_string(),
            sms_recipients: HashMap::new(),
        }
    }
}

impl TestConfig {
    /// Points every outbound endpoint at one mock server.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            incident_endpoint: format!("{base_url}/create_event.json"),
            sms_api_url: format!("{base_url}/Messages.json"),
            connectivity_url: format!("{base_url}/connectivity"),
            ..Self::default()
        }
    }

    pub fn sms_account(&self) -> SmsAccount {
        SmsAccount {
            account_sid: "ACtest".to_string(),
            auth_token: "test-auth-token".to_string(),
            from_number: "+15550000000".to_string(),
            api_url: self.sms_api_url.clone(),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        let mut alerters = HashMap::new();
        alerters.insert(
            TEST_PAGER.to_string(),
            ChannelConfig::Pagerduty {
                integration_key: "test-integration-key".to_string(),
                endpoint: self.incident_endpoint.clone(),
            },
        );
        alerters.insert(
            TEST_SMS.to_string(),
            ChannelConfig::Sms {
                account: self.sms_account(),
                recipients: self.sms_recipients.clone(),
            },
        );

        AppConfig {
            test_interval: self.test_interval,
            connectivity_url: self.connectivity_url.clone(),
            connectivity_budget_seconds: 1,
            alerters,
            messaging: MessagingConfig {
                twilio: self.sms_account(),
                listen_addr: "127.0.0.1:0".to_string(),
                callback_path: "/sms/reply".to_string(),
                welcome_owners: false,
            },
        }
    }
}

/// Builder for service definitions used across cell tests.
pub struct TestService {
    definition: ServiceDefinition,
}

impl TestService {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            definition: ServiceDefinition {
                name: name.to_string(),
                url: url.to_string(),
                code: None,
                disabled: false,
                tests: ValidationRules {
                    retry_timeout_seconds: 1,
                    ..ValidationRules::default()
                },
                owners: Vec::new(),
                alerters: Vec::new(),
            },
        }
    }

    pub fn code(mut self, code: &str) -> Self {
        self.definition.code = Some(code.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.definition.disabled = true;
        self
    }

    pub fn owner(mut self, name: &str, cell: &str) -> Self {
        self.definition.owners.push(OwnerDefinition {
            name: name.to_string(),
            cell: cell.to_string(),
        });
        self
    }

    pub fn alerter(mut self, name: &str) -> Self {
        self.definition.alerters.push(name.to_string());
        self
    }

    pub fn rules(mut self, rules: ValidationRules) -> Self {
        self.definition.tests = rules;
        self
    }

    pub fn build(self) -> ServiceDefinition {
        self.definition
    }
}
